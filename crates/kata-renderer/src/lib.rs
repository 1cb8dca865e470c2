//! Kata renderer
//!
//! HTML plumbing shared by the editor and the previews: a lossless tokenizer
//! for author HTML, anchor hardening, and the summary and full-page previews.

pub mod html;
pub mod links;
pub mod preview;

pub use html::{
    Attribute, StartTag, Token, TokenKind, Tokenizer, decode_entities, is_void_element,
    text_content,
};
pub use links::{SAFE_REL, SAFE_TARGET, apply_safe_link_attrs, harden_links, write_start_tag};
pub use preview::{
    SummaryPreview, render_problem_html, truncate_chars, write_problem_fmt, write_summary_fmt,
};
