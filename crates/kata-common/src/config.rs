//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::problem::DEFAULT_STATEMENT_HTML;

/// Tunables shared by the editor core and the preview renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// HTML new statement sections start with.
    pub statement_template: String,
    /// Token inserted by "insert variable" when nothing is selected.
    pub variable_placeholder: String,
    /// Maximum undo steps kept per statement editor.
    pub history_depth: usize,
    /// Image thumbnails shown in the summary preview.
    pub summary_images: usize,
    /// Video links shown in the summary preview.
    pub summary_videos: usize,
    /// Characters of statement text shown in the summary preview.
    pub excerpt_chars: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            statement_template: DEFAULT_STATEMENT_HTML.to_string(),
            variable_placeholder: "x".to_string(),
            history_depth: 100,
            summary_images: 6,
            summary_videos: 3,
            excerpt_chars: 280,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EditorConfig = serde_json::from_str(r#"{"summary_images": 2}"#).unwrap();
        assert_eq!(config.summary_images, 2);
        assert_eq!(config.summary_videos, 3);
        assert_eq!(config.variable_placeholder, "x");
    }
}
