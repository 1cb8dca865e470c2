//! Editor actions and keybindings.
//!
//! `EditorAction` is the semantic command set of the statement editor,
//! decoupled from how it was triggered. `KeybindingConfig` maps key
//! combinations to actions; hosts convert native key events to [`KeyCombo`].

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::surface::{BlockFormat, ListKind};
use crate::types::Selection;

/// A range in the document, measured in character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Range {
    pub start: usize,
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.start == self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize range so start <= end.
    pub fn normalize(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }
}

impl From<std::ops::Range<usize>> for Range {
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::new(r.start, r.end)
    }
}

/// All statement editor actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    // === Text ===
    /// Replace the selection with text.
    Insert { text: String },
    /// Shift+Enter.
    InsertLineBreak,
    /// Enter.
    InsertParagraph,
    DeleteBackward,
    DeleteForward,

    // === History ===
    Undo,
    Redo,

    // === Formatting ===
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
    /// Wrap the selection (or a placeholder) in an inline code span.
    InsertVariable,
    SetBlockFormat(BlockFormat),
    ToggleList(ListKind),

    /// Open the link dialog for the current selection.
    OpenLinkDialog,

    // === Selection ===
    Select(Selection),
    SelectAll,
}

/// Key values for keyboard input.
///
/// Platform-agnostic; only the keys the editor binds or passes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key, lowercased for letters.
    Character(SmolStr),
    Unidentified,

    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    Alt,
    Control,
    Meta,
    Shift,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Get the primary modifier for the platform (Cmd on Mac, Ctrl elsewhere).
    pub fn primary(is_mac: bool) -> Self {
        if is_mac { Self::META } else { Self::CTRL }
    }

    pub fn with_shift(self) -> Self {
        Self {
            shift: true,
            ..self
        }
    }

    pub fn with_alt(self) -> Self {
        Self { alt: true, ..self }
    }
}

/// A key combination for triggering an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn primary(key: Key, is_mac: bool) -> Self {
        Self::with_modifiers(key, Modifiers::primary(is_mac))
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let the platform handle it.
    NotHandled,
    /// Navigation and modifier keys.
    PassThrough,
}

/// Key combination to action table.
#[derive(Debug, Clone, Default)]
pub struct KeybindingConfig {
    bindings: HashMap<KeyCombo, EditorAction>,
}

impl KeybindingConfig {
    /// The standard bindings, with Cmd as primary on Mac and Ctrl elsewhere.
    pub fn default_for_platform(is_mac: bool) -> Self {
        let primary = Modifiers::primary(is_mac);
        let ch = |c: &str| Key::character(c);
        let mut config = Self::default();

        config.bind(KeyCombo::with_modifiers(ch("b"), primary), EditorAction::ToggleBold);
        config.bind(KeyCombo::with_modifiers(ch("i"), primary), EditorAction::ToggleItalic);
        config.bind(KeyCombo::with_modifiers(ch("u"), primary), EditorAction::ToggleUnderline);
        config.bind(KeyCombo::with_modifiers(ch("k"), primary), EditorAction::OpenLinkDialog);
        config.bind(KeyCombo::with_modifiers(ch("e"), primary), EditorAction::InsertVariable);
        config.bind(KeyCombo::with_modifiers(ch("a"), primary), EditorAction::SelectAll);

        config.bind(KeyCombo::with_modifiers(ch("z"), primary), EditorAction::Undo);
        config.bind(
            KeyCombo::with_modifiers(ch("z"), primary.with_shift()),
            EditorAction::Redo,
        );
        if !is_mac {
            config.bind(KeyCombo::with_modifiers(ch("y"), primary), EditorAction::Redo);
        }

        config.bind(
            KeyCombo::with_modifiers(ch("7"), primary.with_shift()),
            EditorAction::ToggleList(ListKind::Numbered),
        );
        config.bind(
            KeyCombo::with_modifiers(ch("8"), primary.with_shift()),
            EditorAction::ToggleList(ListKind::Bulleted),
        );
        for (digit, format) in [
            ("0", BlockFormat::Paragraph),
            ("1", BlockFormat::Heading1),
            ("2", BlockFormat::Heading2),
            ("3", BlockFormat::Heading3),
        ] {
            config.bind(
                KeyCombo::with_modifiers(ch(digit), primary.with_alt()),
                EditorAction::SetBlockFormat(format),
            );
        }

        config.bind(KeyCombo::new(Key::Enter), EditorAction::InsertParagraph);
        config.bind(
            KeyCombo::with_modifiers(Key::Enter, Modifiers::SHIFT),
            EditorAction::InsertLineBreak,
        );
        config.bind(KeyCombo::new(Key::Backspace), EditorAction::DeleteBackward);
        config.bind(KeyCombo::new(Key::Delete), EditorAction::DeleteForward);
        config
    }

    pub fn bind(&mut self, combo: KeyCombo, action: EditorAction) {
        self.bindings.insert(combo, action);
    }

    pub fn lookup(&self, combo: &KeyCombo) -> Option<&EditorAction> {
        self.bindings.get(combo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_modifier_per_platform() {
        let mac = KeybindingConfig::default_for_platform(true);
        let other = KeybindingConfig::default_for_platform(false);
        let bold_mac = KeyCombo::primary(Key::character("b"), true);
        let bold_other = KeyCombo::primary(Key::character("b"), false);

        assert_eq!(mac.lookup(&bold_mac), Some(&EditorAction::ToggleBold));
        assert_eq!(mac.lookup(&bold_other), None);
        assert_eq!(other.lookup(&bold_other), Some(&EditorAction::ToggleBold));
    }

    #[test]
    fn test_shifted_and_alt_bindings() {
        let config = KeybindingConfig::default_for_platform(false);
        let redo = KeyCombo::with_modifiers(Key::character("z"), Modifiers::CTRL.with_shift());
        assert_eq!(config.lookup(&redo), Some(&EditorAction::Redo));

        let bullets = KeyCombo::with_modifiers(Key::character("8"), Modifiers::CTRL.with_shift());
        assert_eq!(
            config.lookup(&bullets),
            Some(&EditorAction::ToggleList(ListKind::Bulleted))
        );

        let h2 = KeyCombo::with_modifiers(Key::character("2"), Modifiers::CTRL.with_alt());
        assert_eq!(
            config.lookup(&h2),
            Some(&EditorAction::SetBlockFormat(BlockFormat::Heading2))
        );
    }

    #[test]
    fn test_range_normalize() {
        let range = Range::new(7, 2).normalize();
        assert_eq!(range, Range::new(2, 7));
        assert_eq!(range.len(), 5);
        assert!(Range::caret(3).is_caret());
    }
}
