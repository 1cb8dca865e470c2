//! The statement editor.
//!
//! `RichTextEditor` binds one statement's HTML to a [`RichTextSurface`]. The
//! HTML string is the single source of truth: rich commands run on the
//! surface and the result is serialized back into it, plain-HTML edits
//! replace it verbatim. Switching modes never re-serializes, so toggling
//! between modes without editing leaves the string byte-identical.
//!
//! State machine:
//!
//! ```text
//!            edit/format             Link command
//!   Idle ----------------> Composing ------------> LinkDialogOpen
//!    ^                      ^    |                     |
//!    |        blur          |    +---------------------+
//!    +----------------------+      confirm/remove/cancel
//! ```

use kata_common::{EditMode, EditorConfig, Statement};

use crate::history::History;
use crate::surface::{BlockFormat, InlineMark, LinkInfo, ListKind, RichTextSurface};
use crate::types::Selection;

/// Link dialog contents, captured when the dialog opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDialog {
    /// Selection to restore before the link is applied.
    pub selection: Selection,
    /// The anchor under the selection, if any.
    pub existing: Option<LinkInfo>,
    /// Prefilled link text.
    pub text: String,
    /// Prefilled URL.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditorState {
    #[default]
    Idle,
    Composing,
    LinkDialogOpen(LinkDialog),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LinkDialogError {
    #[error("link text must not be empty")]
    EmptyText,
    #[error("link URL must not be empty")]
    EmptyUrl,
    #[error("no link dialog is open")]
    NotOpen,
}

/// Editor for one statement section.
#[derive(Debug)]
pub struct RichTextEditor<S> {
    surface: S,
    html: String,
    mode: EditMode,
    state: EditorState,
    history: History,
    placeholder: String,
}

impl<S: RichTextSurface> RichTextEditor<S> {
    pub fn new(mut surface: S, statement: &Statement, config: &EditorConfig) -> Self {
        if statement.edit_mode == EditMode::Rich {
            surface.load_html(&statement.content_html);
        }
        Self {
            surface,
            html: statement.content_html.clone(),
            mode: statement.edit_mode,
            state: EditorState::Idle,
            history: History::new(config.history_depth),
            placeholder: config.variable_placeholder.clone(),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn edit_mode(&self) -> EditMode {
        self.mode
    }

    /// Current contents as a statement payload.
    pub fn statement(&self) -> Statement {
        Statement {
            edit_mode: self.mode,
            content_html: self.html.clone(),
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn selection(&self) -> Selection {
        self.surface.selection()
    }

    pub fn link_dialog(&self) -> Option<&LinkDialog> {
        match &self.state {
            EditorState::LinkDialogOpen(dialog) => Some(dialog),
            _ => None,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Enter `Composing` if a rich command may run now.
    fn begin(&mut self) -> bool {
        if self.mode != EditMode::Rich || self.link_dialog().is_some() {
            return false;
        }
        self.state = EditorState::Composing;
        true
    }

    /// Pull the surface's HTML into the source of truth.
    fn commit(&mut self, changed: bool) -> bool {
        if !changed {
            return false;
        }
        let html = self.surface.to_html();
        if html == self.html {
            return false;
        }
        let previous = std::mem::replace(&mut self.html, html);
        self.history.record(previous);
        true
    }

    // === Rich commands ===

    pub fn toggle_inline(&mut self, mark: InlineMark) -> bool {
        if !self.begin() {
            return false;
        }
        tracing::trace!(?mark, "toggle inline");
        let changed = self.surface.apply_inline_format(mark);
        self.commit(changed)
    }

    pub fn set_block_format(&mut self, format: BlockFormat) -> bool {
        if !self.begin() {
            return false;
        }
        tracing::trace!(?format, "block format");
        let changed = self.surface.apply_block_format(format);
        self.commit(changed)
    }

    pub fn toggle_list(&mut self, kind: ListKind) -> bool {
        if !self.begin() {
            return false;
        }
        tracing::trace!(?kind, "toggle list");
        let changed = self.surface.toggle_list(kind);
        self.commit(changed)
    }

    /// Wrap the selection, or the configured placeholder, in a code span.
    pub fn insert_variable(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        tracing::trace!("insert variable");
        let changed = self
            .surface
            .insert_inline_token(InlineMark::Variable, &self.placeholder);
        self.commit(changed)
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        if !self.begin() {
            return false;
        }
        let changed = self.surface.insert_text(text);
        self.commit(changed)
    }

    pub fn insert_paragraph(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        let changed = self.surface.insert_paragraph();
        self.commit(changed)
    }

    pub fn insert_line_break(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        let changed = self.surface.insert_line_break();
        self.commit(changed)
    }

    pub fn delete_backward(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        let changed = self.surface.delete_backward();
        self.commit(changed)
    }

    pub fn delete_forward(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        let changed = self.surface.delete_forward();
        self.commit(changed)
    }

    pub fn select(&mut self, selection: Selection) {
        if self.begin() {
            self.surface.set_selection(selection);
        }
    }

    pub fn select_all(&mut self) {
        if self.begin() {
            self.surface.select_all();
        }
    }

    // === Link dialog ===

    /// Open the link dialog for the current selection.
    pub fn open_link_dialog(&mut self) -> bool {
        if !self.begin() {
            return false;
        }
        let selection = self.surface.selection();
        let existing = self.surface.anchor_at(selection.to_range());
        let (text, url) = match &existing {
            Some(anchor) => (anchor.text.clone(), anchor.href.clone()),
            None => (self.surface.selected_text(), String::new()),
        };
        tracing::trace!(existing = existing.is_some(), "link dialog opened");
        self.state = EditorState::LinkDialogOpen(LinkDialog {
            selection,
            existing,
            text,
            url,
        });
        true
    }

    /// Apply the dialog. On a validation error the dialog stays open.
    pub fn confirm_link(&mut self, text: &str, url: &str) -> Result<bool, LinkDialogError> {
        let dialog = self.link_dialog().ok_or(LinkDialogError::NotOpen)?;
        if text.trim().is_empty() {
            return Err(LinkDialogError::EmptyText);
        }
        let url = url.trim();
        if url.is_empty() {
            return Err(LinkDialogError::EmptyUrl);
        }
        let selection = dialog.selection;
        self.state = EditorState::Composing;
        self.surface.set_selection(selection);
        let changed = self
            .surface
            .insert_or_update_link(selection.to_range(), text, url);
        Ok(self.commit(changed))
    }

    /// Unwrap the anchor the dialog was opened on.
    pub fn remove_link(&mut self) -> bool {
        let Some(dialog) = self.link_dialog() else {
            return false;
        };
        let selection = dialog.selection;
        self.state = EditorState::Composing;
        self.surface.set_selection(selection);
        let changed = self.surface.remove_link(selection.to_range());
        self.commit(changed)
    }

    pub fn cancel_link(&mut self) {
        if let Some(dialog) = self.link_dialog() {
            let selection = dialog.selection;
            self.state = EditorState::Composing;
            self.surface.set_selection(selection);
        }
    }

    /// Focus left the editor: back to `Idle`, pending formats dropped.
    pub fn blur(&mut self) {
        self.state = EditorState::Idle;
        self.surface.clear_pending_marks();
    }

    // === Modes and raw HTML ===

    pub fn set_edit_mode(&mut self, mode: EditMode) -> bool {
        if mode == self.mode {
            return false;
        }
        if self.link_dialog().is_some() {
            self.state = EditorState::Composing;
        }
        if mode == EditMode::Rich {
            self.surface.load_html(&self.html);
        }
        tracing::trace!(?mode, "edit mode switched");
        self.mode = mode;
        true
    }

    /// Replace the HTML verbatim. Only meaningful in HTML mode.
    pub fn set_html(&mut self, html: &str) -> bool {
        if self.mode != EditMode::Html || html == self.html {
            return false;
        }
        self.state = EditorState::Composing;
        let previous = std::mem::replace(&mut self.html, html.to_string());
        self.history.record(previous);
        true
    }

    // === History ===

    pub fn undo(&mut self) -> bool {
        if self.link_dialog().is_some() {
            return false;
        }
        let Some(previous) = self.history.undo(self.html.clone()) else {
            return false;
        };
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.link_dialog().is_some() {
            return false;
        }
        let Some(next) = self.history.redo(self.html.clone()) else {
            return false;
        };
        self.restore(next);
        true
    }

    fn restore(&mut self, html: String) {
        self.state = EditorState::Composing;
        self.html = html;
        if self.mode == EditMode::Rich {
            self.surface.load_html(&self.html);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockSurface;

    fn editor(html: &str) -> RichTextEditor<BlockSurface> {
        RichTextEditor::new(
            BlockSurface::new(),
            &Statement {
                edit_mode: EditMode::Rich,
                content_html: html.to_string(),
            },
            &EditorConfig::default(),
        )
    }

    #[test]
    fn test_state_transitions() {
        let mut ed = editor("<p>Hi</p>");
        assert_eq!(ed.state(), &EditorState::Idle);
        ed.insert_text("!");
        assert_eq!(ed.state(), &EditorState::Composing);
        assert!(ed.open_link_dialog());
        assert!(ed.link_dialog().is_some());
        ed.cancel_link();
        assert_eq!(ed.state(), &EditorState::Composing);
        ed.blur();
        assert_eq!(ed.state(), &EditorState::Idle);
    }

    #[test]
    fn test_blur_drops_pending_marks() {
        let mut ed = editor("<p>Hi</p>");
        assert!(!ed.toggle_inline(InlineMark::Bold));
        assert!(ed.surface().pending_marks().is_some());
        ed.blur();
        assert!(ed.surface().pending_marks().is_none());
        ed.insert_text("x");
        assert_eq!(ed.html(), "<p>Hix</p>");
    }

    #[test]
    fn test_commands_while_dialog_open_are_ignored() {
        let mut ed = editor("<p>Hi</p>");
        ed.open_link_dialog();
        assert!(!ed.insert_text("x"));
        assert!(!ed.undo());
        assert_eq!(ed.html(), "<p>Hi</p>");
    }

    #[test]
    fn test_link_validation_keeps_dialog_open() {
        let mut ed = editor("<p>Hi</p>");
        ed.open_link_dialog();
        assert_eq!(ed.confirm_link("  ", "https://x.dev"), Err(LinkDialogError::EmptyText));
        assert_eq!(ed.confirm_link("docs", " "), Err(LinkDialogError::EmptyUrl));
        assert!(ed.link_dialog().is_some());
        assert_eq!(ed.confirm_link("docs", "https://x.dev"), Ok(true));
        assert!(ed.link_dialog().is_none());
        assert_eq!(
            ed.html(),
            r#"<p>Hi<a href="https://x.dev" target="_blank" rel="noopener noreferrer">docs</a></p>"#
        );
    }

    #[test]
    fn test_confirm_without_dialog() {
        let mut ed = editor("<p>Hi</p>");
        assert_eq!(ed.confirm_link("a", "b"), Err(LinkDialogError::NotOpen));
    }

    #[test]
    fn test_dialog_prefills_existing_anchor() {
        let mut ed = editor(r#"<p>See <a href="https://a.dev">docs</a></p>"#);
        ed.select(Selection::collapsed(5));
        ed.open_link_dialog();
        let dialog = ed.link_dialog().unwrap();
        assert_eq!(dialog.text, "docs");
        assert_eq!(dialog.url, "https://a.dev");
        assert_eq!(dialog.selection, Selection::collapsed(5));
    }

    #[test]
    fn test_remove_link_from_dialog() {
        let mut ed = editor(r#"<p>See <a href="https://a.dev">docs</a></p>"#);
        ed.select(Selection::collapsed(5));
        ed.open_link_dialog();
        assert!(ed.remove_link());
        assert_eq!(ed.html(), "<p>See docs</p>");
    }

    #[test]
    fn test_mode_switch_keeps_html_byte_identical() {
        let html = "<div>\n  <p>Raw <span style=\"color:red\">markup</span></p>\n</div>";
        let mut ed = editor(html);
        assert!(ed.set_edit_mode(EditMode::Html));
        assert!(ed.set_edit_mode(EditMode::Rich));
        assert!(!ed.set_edit_mode(EditMode::Rich));
        assert_eq!(ed.html(), html);
    }

    #[test]
    fn test_html_mode_edits_replace_verbatim() {
        let mut ed = editor("<p>a</p>");
        assert!(!ed.set_html("<p>b</p>"));
        ed.set_edit_mode(EditMode::Html);
        assert!(ed.set_html("<p>b <img src=x></p>"));
        assert!(!ed.insert_text("ignored"));
        assert_eq!(ed.html(), "<p>b <img src=x></p>");
        assert_eq!(ed.statement().edit_mode, EditMode::Html);
    }

    #[test]
    fn test_undo_across_modes() {
        let mut ed = editor("<p>a</p>");
        ed.insert_text("b");
        ed.set_edit_mode(EditMode::Html);
        ed.set_html("<p>raw</p>");
        ed.set_edit_mode(EditMode::Rich);

        assert!(ed.undo());
        assert_eq!(ed.html(), "<p>ab</p>");
        assert_eq!(ed.surface().to_html(), "<p>ab</p>");
        assert!(ed.undo());
        assert_eq!(ed.html(), "<p>a</p>");
        assert!(!ed.undo());
        assert!(ed.redo());
        assert_eq!(ed.html(), "<p>ab</p>");
    }

    #[test]
    fn test_variable_uses_configured_placeholder() {
        let config = EditorConfig {
            variable_placeholder: "n".to_string(),
            ..EditorConfig::default()
        };
        let mut ed = RichTextEditor::new(
            BlockSurface::new(),
            &Statement {
                edit_mode: EditMode::Rich,
                content_html: "<p>Given </p>".to_string(),
            },
            &config,
        );
        assert!(ed.insert_variable());
        ed.insert_text(" numbers");
        assert_eq!(ed.html(), "<p>Given <code>n</code> numbers</p>");
    }
}
