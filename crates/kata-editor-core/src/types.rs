//! Selection type shared by surfaces and the editor.

use crate::actions::Range;

/// Text selection with anchor and head positions.
///
/// The anchor is where the selection started, the head is where the caret is now.
/// They may be in any order - use `start()` and `end()` for ordered bounds.
/// Offsets count characters, with one separator between blocks.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    /// Where selection started
    pub anchor: usize,
    /// Where the caret is now
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A caret.
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    /// Clamp both ends to `max`.
    pub fn clamp(self, max: usize) -> Self {
        Self {
            anchor: self.anchor.min(max),
            head: self.head.min(max),
        }
    }

    /// Ordered bounds as a [`Range`].
    pub fn to_range(&self) -> Range {
        Range::new(self.start(), self.end())
    }
}

impl From<Range> for Selection {
    fn from(range: Range) -> Self {
        Self::new(range.start, range.end)
    }
}
