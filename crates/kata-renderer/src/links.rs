//! Anchor hardening.
//!
//! Statement HTML is rendered as-is, except that every anchor is forced to
//! open in a new tab without leaking the opener or referrer. This runs both
//! in the editor (when links are created) and in every preview, because HTML
//! typed into the plain-HTML mode never goes through the editor's link path.

use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_html};

use crate::html::{Attribute, StartTag, TokenKind, Tokenizer};

pub const SAFE_TARGET: &str = "_blank";
pub const SAFE_REL: &str = "noopener noreferrer";

/// Force `target` and `rel` on an anchor's attribute list.
///
/// Existing attributes keep their position and get their value replaced;
/// missing ones are appended. Returns true if anything changed.
pub fn apply_safe_link_attrs(attrs: &mut Vec<Attribute>) -> bool {
    let mut changed = false;
    for (name, value) in [("target", SAFE_TARGET), ("rel", SAFE_REL)] {
        match attrs
            .iter_mut()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
        {
            Some(attr) => {
                if attr.value.as_deref() != Some(value) {
                    attr.value = Some(value.to_string());
                    changed = true;
                }
            }
            None => {
                attrs.push(Attribute::new(name, value));
                changed = true;
            }
        }
    }
    changed
}

/// Write a start tag with escaped attribute values.
pub fn write_start_tag<W: StrWrite>(
    mut writer: W,
    name: &str,
    attrs: &[Attribute],
    self_closing: bool,
) -> Result<(), W::Error> {
    writer.write_str("<")?;
    writer.write_str(name)?;
    for attr in attrs {
        writer.write_str(" ")?;
        writer.write_str(&attr.name)?;
        if let Some(value) = &attr.value {
            writer.write_str("=\"")?;
            escape_html(&mut writer, value)?;
            writer.write_str("\"")?;
        }
    }
    if self_closing {
        writer.write_str(" />")
    } else {
        writer.write_str(">")
    }
}

/// Rewrite every `<a>` start tag in `html` with safe `target`/`rel` values.
///
/// Everything that is not an anchor start tag is copied byte for byte, and
/// anchors that are already safe are left untouched, so the function is
/// idempotent.
pub fn harden_links(html: &str) -> String {
    let mut out = String::with_capacity(html.len() + 32);
    let mut rewritten = 0usize;
    for token in Tokenizer::new(html) {
        match token.kind {
            TokenKind::StartTag(StartTag {
                name,
                mut attrs,
                self_closing,
            }) if name == "a" => {
                if apply_safe_link_attrs(&mut attrs) {
                    rewritten += 1;
                    // Writing into a String cannot fail.
                    let _ = write_start_tag(FmtWriter(&mut out), &name, &attrs, self_closing);
                } else {
                    out.push_str(token.raw);
                }
            }
            _ => out.push_str(token.raw),
        }
    }
    if rewritten > 0 {
        tracing::trace!(rewritten, "hardened anchors");
    }
    out
}
