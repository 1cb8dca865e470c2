//! The narrow interface the editor drives.
//!
//! A `RichTextSurface` owns a structured view of one statement's HTML plus a
//! selection. The editor never touches HTML structure directly: it issues
//! commands here and reads the result back with [`RichTextSurface::to_html`].
//! [`BlockSurface`](crate::block::BlockSurface) is the in-process
//! implementation; a browser host can implement the same trait over a
//! contenteditable element.
//!
//! Every mutating method returns true if the document content changed.

use crate::actions::Range;
use crate::types::Selection;

/// Character-level formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InlineMark {
    Bold,
    Italic,
    Underline,
    /// Inline code span used for identifiers and math variables.
    Variable,
}

/// The set of inline marks on a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Marks {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub variable: bool,
}

impl Marks {
    pub const NONE: Self = Self {
        bold: false,
        italic: false,
        underline: false,
        variable: false,
    };

    pub fn has(&self, mark: InlineMark) -> bool {
        match mark {
            InlineMark::Bold => self.bold,
            InlineMark::Italic => self.italic,
            InlineMark::Underline => self.underline,
            InlineMark::Variable => self.variable,
        }
    }

    pub fn set(&mut self, mark: InlineMark, on: bool) {
        match mark {
            InlineMark::Bold => self.bold = on,
            InlineMark::Italic => self.italic = on,
            InlineMark::Underline => self.underline = on,
            InlineMark::Variable => self.variable = on,
        }
    }

    pub fn with(mut self, mark: InlineMark, on: bool) -> Self {
        self.set(mark, on);
        self
    }
}

/// Block-level formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockFormat {
    #[default]
    Paragraph,
    Heading1,
    Heading2,
    Heading3,
    CodeBlock,
}

impl BlockFormat {
    /// Heading for `level`; levels past 3 fold into 3.
    pub fn heading(level: u8) -> Option<Self> {
        match level {
            0 => None,
            1 => Some(Self::Heading1),
            2 => Some(Self::Heading2),
            _ => Some(Self::Heading3),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Paragraph => "p",
            Self::Heading1 => "h1",
            Self::Heading2 => "h2",
            Self::Heading3 => "h3",
            Self::CodeBlock => "pre",
        }
    }
}

/// List style of a list-item block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Bulleted => "ul",
            Self::Numbered => "ol",
        }
    }
}

/// An existing anchor found under a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    /// Extent of the anchor's text.
    pub range: Range,
    pub href: String,
    pub text: String,
}

pub trait RichTextSurface {
    /// Replace the whole document. The caret moves to the end.
    fn load_html(&mut self, html: &str);

    fn to_html(&self) -> String;

    /// Characters in the document, counting one per block separator.
    fn text_len(&self) -> usize;

    fn selection(&self) -> Selection;

    /// Move the selection. Clears pending marks.
    fn set_selection(&mut self, selection: Selection);

    fn selected_text(&self) -> String;

    /// Marks the next typed text will carry, if toggled on an empty selection.
    fn pending_marks(&self) -> Option<Marks>;

    fn clear_pending_marks(&mut self);

    /// Toggle `mark` over the selection.
    ///
    /// With an empty selection only the pending marks change, and this
    /// returns false.
    fn apply_inline_format(&mut self, mark: InlineMark) -> bool;

    /// Convert the touched blocks to `format`, or back to paragraphs if they
    /// all have it already.
    fn apply_block_format(&mut self, format: BlockFormat) -> bool;

    /// Flip list membership of the touched blocks.
    fn toggle_list(&mut self, kind: ListKind) -> bool;

    /// Mark the selection with `mark`, or insert `placeholder` carrying it.
    /// The caret ends up right after the token.
    fn insert_inline_token(&mut self, mark: InlineMark, placeholder: &str) -> bool;

    /// Replace the selection with `text`.
    fn insert_text(&mut self, text: &str) -> bool;

    /// Split the current block (Enter).
    fn insert_paragraph(&mut self) -> bool;

    /// Insert a line break inside the current block (Shift+Enter).
    fn insert_line_break(&mut self) -> bool;

    fn delete_backward(&mut self) -> bool;

    fn delete_forward(&mut self) -> bool;

    /// The anchor containing `range`, if any.
    fn anchor_at(&self, range: Range) -> Option<LinkInfo>;

    /// Update the anchor containing `range` in place, or insert a new one.
    fn insert_or_update_link(&mut self, range: Range, text: &str, url: &str) -> bool;

    /// Unwrap the anchor containing `range`, keeping its text.
    fn remove_link(&mut self, range: Range) -> bool;

    fn select_all(&mut self) {
        let len = self.text_len();
        self.set_selection(Selection::new(0, len));
    }
}
