//! Action execution for statement editors.

use crate::actions::{EditorAction, KeyCombo, KeybindingConfig, KeydownResult};
use crate::editor::RichTextEditor;
use crate::surface::{InlineMark, RichTextSurface};

/// Execute an editor action.
///
/// This is the central dispatch point for all editor operations.
/// Returns true if the HTML changed or the link dialog opened.
pub fn execute_action<S: RichTextSurface>(
    editor: &mut RichTextEditor<S>,
    action: &EditorAction,
) -> bool {
    match action {
        EditorAction::Insert { text } => editor.insert_text(text),
        EditorAction::InsertLineBreak => editor.insert_line_break(),
        EditorAction::InsertParagraph => editor.insert_paragraph(),
        EditorAction::DeleteBackward => editor.delete_backward(),
        EditorAction::DeleteForward => editor.delete_forward(),
        EditorAction::Undo => editor.undo(),
        EditorAction::Redo => editor.redo(),
        EditorAction::ToggleBold => editor.toggle_inline(InlineMark::Bold),
        EditorAction::ToggleItalic => editor.toggle_inline(InlineMark::Italic),
        EditorAction::ToggleUnderline => editor.toggle_inline(InlineMark::Underline),
        EditorAction::InsertVariable => editor.insert_variable(),
        EditorAction::SetBlockFormat(format) => editor.set_block_format(*format),
        EditorAction::ToggleList(kind) => editor.toggle_list(*kind),
        EditorAction::OpenLinkDialog => editor.open_link_dialog(),
        EditorAction::Select(selection) => {
            editor.select(*selection);
            false
        }
        EditorAction::SelectAll => {
            editor.select_all();
            false
        }
    }
}

/// Handle a keydown event using the keybinding configuration.
///
/// Plain character input is left to the host's text input path.
pub fn handle_keydown<S: RichTextSurface>(
    editor: &mut RichTextEditor<S>,
    config: &KeybindingConfig,
    combo: &KeyCombo,
) -> KeydownResult {
    if let Some(action) = config.lookup(combo) {
        execute_action(editor, action);
        return KeydownResult::Handled;
    }

    if combo.key.is_navigation() || combo.key.is_modifier() {
        return KeydownResult::PassThrough;
    }

    KeydownResult::NotHandled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{Key, Modifiers};
    use crate::block::BlockSurface;
    use crate::surface::BlockFormat;
    use crate::types::Selection;
    use kata_common::{EditMode, EditorConfig, Statement};

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
    fn test_dispatch_sequence() {
        let mut ed = editor("<p>Two sum</p>");
        let actions = [
            EditorAction::Select(Selection::new(0, 3)),
            EditorAction::ToggleBold,
            EditorAction::SetBlockFormat(BlockFormat::Heading2),
            EditorAction::Select(Selection::collapsed(7)),
            EditorAction::InsertParagraph,
            EditorAction::Insert {
                text: "Find ".to_string(),
            },
            EditorAction::InsertVariable,
        ];
        for action in &actions {
            execute_action(&mut ed, action);
        }
        insta::assert_snapshot!(ed.html(), @"<h2><b>Two</b> sum</h2><p>Find <code>x</code></p>");
    }

    #[test]
    fn test_keydown_routing() {
        let mut ed = editor("<p>abc</p>");
        let config = KeybindingConfig::default_for_platform(false);

        let select_all = KeyCombo::primary(Key::character("a"), false);
        assert_eq!(handle_keydown(&mut ed, &config, &select_all), KeydownResult::Handled);
        let italic = KeyCombo::with_modifiers(Key::character("i"), Modifiers::CTRL);
        assert_eq!(handle_keydown(&mut ed, &config, &italic), KeydownResult::Handled);
        assert_eq!(ed.html(), "<p><i>abc</i></p>");

        let left = KeyCombo::new(Key::ArrowLeft);
        assert_eq!(handle_keydown(&mut ed, &config, &left), KeydownResult::PassThrough);
        let typed = KeyCombo::new(Key::character("q"));
        assert_eq!(handle_keydown(&mut ed, &config, &typed), KeydownResult::NotHandled);
    }
}
