//! KDL configuration for the `kata` binary.
//!
//! ```kdl
//! statement-template "<p>Describe the problem here.</p>"
//! variable-placeholder "n"
//! history-depth 200
//! summary-images 4
//! summary-videos 2
//! excerpt-chars 160
//! ```
//!
//! Every node is optional; missing ones keep their defaults.

use std::path::{Path, PathBuf};

use kata_common::{EditorConfig, KataError};
use kdl::KdlDocument;

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kata").join("config.kdl"))
}

/// Load the editor configuration.
///
/// An explicit path must exist. The default location is used only if present.
pub fn load(explicit: Option<&Path>) -> Result<EditorConfig, KataError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(EditorConfig::default()),
        },
    };
    let source = std::fs::read_to_string(&path)?;
    let config = parse(&source)?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

pub fn parse(source: &str) -> Result<EditorConfig, KataError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|err: kdl::KdlError| KataError::Config(err.to_string()))?;
    let mut config = EditorConfig::default();

    if let Some(value) = string_value(&doc, "statement-template")? {
        config.statement_template = value;
    }
    if let Some(value) = string_value(&doc, "variable-placeholder")? {
        config.variable_placeholder = value;
    }
    if let Some(value) = count_value(&doc, "history-depth")? {
        config.history_depth = value;
    }
    if let Some(value) = count_value(&doc, "summary-images")? {
        config.summary_images = value;
    }
    if let Some(value) = count_value(&doc, "summary-videos")? {
        config.summary_videos = value;
    }
    if let Some(value) = count_value(&doc, "excerpt-chars")? {
        config.excerpt_chars = value;
    }
    Ok(config)
}

fn string_value(doc: &KdlDocument, name: &str) -> Result<Option<String>, KataError> {
    let Some(node) = doc.get(name) else {
        return Ok(None);
    };
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_string())
        .map(|value| Some(value.to_string()))
        .ok_or_else(|| KataError::Config(format!("`{name}` expects a string")))
}

fn count_value(doc: &KdlDocument, name: &str) -> Result<Option<usize>, KataError> {
    let Some(node) = doc.get(name) else {
        return Ok(None);
    };
    node.entries()
        .first()
        .and_then(|entry| entry.value().as_i64())
        .and_then(|value| usize::try_from(value).ok())
        .map(Some)
        .ok_or_else(|| KataError::Config(format!("`{name}` expects a non-negative integer")))
}
