//! Error types for kata.
//!
//! Structural edits in the editor core never fail (invalid requests are
//! no-ops), so errors only show up where data crosses a boundary: payloads
//! coming back from the problem repository, files read by the CLI.

use miette::Diagnostic;

use crate::problem::SectionId;

/// Main error type for kata operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum KataError {
    /// Payload violates a structural invariant
    #[error(transparent)]
    #[diagnostic(transparent)]
    Payload(#[from] PayloadError),

    /// Payload is not valid JSON or does not match the schema
    #[error("invalid problem payload: {0}")]
    #[diagnostic(code(kata::payload::json))]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error(transparent)]
    #[diagnostic(code(kata::io))]
    Io(#[from] std::io::Error),

    /// Configuration could not be read
    #[error("invalid configuration: {0}")]
    #[diagnostic(code(kata::config))]
    Config(String),
}

/// A payload that cannot be turned back into an editable problem.
#[derive(thiserror::Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PayloadError {
    #[error("problem has no statement section")]
    #[diagnostic(
        code(kata::payload::missing_statement),
        help("every problem needs at least one statement section")
    )]
    MissingStatement,

    #[error("problem has {count} hint sections, at most one is allowed")]
    #[diagnostic(code(kata::payload::duplicate_hints))]
    DuplicateHints { count: usize },

    #[error("hint section `{id}` is at position {position} but must be last of {len}")]
    #[diagnostic(code(kata::payload::hints_not_last))]
    HintsNotLast {
        id: SectionId,
        position: usize,
        len: usize,
    },

    #[error("section `{id}` has no items")]
    #[diagnostic(
        code(kata::payload::empty_section),
        help("list sections keep at least one item; remove the section instead")
    )]
    EmptySection { id: SectionId },

    #[error("section id `{id}` is used more than once")]
    #[diagnostic(code(kata::payload::duplicate_id))]
    DuplicateId { id: SectionId },

    #[error("section id `{id}` leaves no room for new sections")]
    #[diagnostic(
        code(kata::payload::id_out_of_range),
        help("renumber the sections with smaller `sec-{{n}}` ids")
    )]
    IdOutOfRange { id: SectionId },
}
