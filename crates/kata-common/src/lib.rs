//! kata-common: shared types for the problem authoring core.
//!
//! This crate provides:
//! - the section model (`Section`, `SectionBody`, `SectionKind`) and problem metadata
//! - `ProblemPayload`, the publish format handed to the problem repository
//! - error types and the editor configuration
//! - console tracing bootstrap behind the `telemetry` feature

pub mod config;
pub mod error;
pub mod payload;
pub mod problem;
#[cfg(feature = "telemetry")]
pub mod telemetry;

pub use config::EditorConfig;
pub use error::{KataError, PayloadError};
pub use payload::ProblemPayload;
pub use problem::{
    Difficulty, EditMode, Example, MediaItem, ParseDifficultyError, ProblemMeta, Section,
    SectionBody, SectionId, SectionKind, Statement, TagSet, normalize_tag,
};
pub use smol_str::SmolStr;
