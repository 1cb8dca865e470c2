//! End-to-end authoring flows through the composer.

use kata_common::{EditMode, EditorConfig, SectionKind};
use kata_editor_core::{
    EditorAction, MoveDirection, ProblemComposer, Selection, execute_action,
};

fn kinds(composer: &ProblemComposer) -> Vec<SectionKind> {
    composer
        .store()
        .sections()
        .iter()
        .map(|section| section.kind())
        .collect()
}

#[test]
fn sections_keep_hints_last() {
    let mut composer: ProblemComposer = ProblemComposer::new(EditorConfig::default());
    composer.add_section(SectionKind::Examples).unwrap();
    composer.add_section(SectionKind::Hints).unwrap();
    composer.add_section(SectionKind::Constraints).unwrap();

    assert_eq!(
        kinds(&composer),
        vec![
            SectionKind::Statement,
            SectionKind::Examples,
            SectionKind::Constraints,
            SectionKind::Hints,
        ]
    );

    // Constraint cannot move below the hints.
    assert!(!composer.move_section(2, MoveDirection::Down));
    assert!(composer.move_section(2, MoveDirection::Up));
    assert_eq!(
        kinds(&composer),
        vec![
            SectionKind::Statement,
            SectionKind::Constraints,
            SectionKind::Examples,
            SectionKind::Hints,
        ]
    );
}

#[test]
fn second_hints_section_is_refused() {
    let mut composer: ProblemComposer = ProblemComposer::new(EditorConfig::default());
    assert!(composer.add_section(SectionKind::Hints).is_some());
    assert!(composer.add_section(SectionKind::Hints).is_none());
    let hints = kinds(&composer)
        .into_iter()
        .filter(|kind| *kind == SectionKind::Hints)
        .count();
    assert_eq!(hints, 1);
}

#[test]
fn last_statement_cannot_be_removed() {
    let mut composer: ProblemComposer = ProblemComposer::new(EditorConfig::default());
    let id = composer.store().statement_ids()[0].clone();
    let before = composer.store().to_payload();
    assert!(!composer.remove_section(&id));
    assert_eq!(composer.store().to_payload(), before);
    assert!(composer.editor(&id).is_some());
}

#[test]
fn unchanged_link_confirm_is_byte_identical() {
    let html = r#"<p>Read the <a href="https://en.wikipedia.org/wiki/Two_Sum" target="_blank" rel="noopener noreferrer">article</a> first.</p>"#;
    let mut composer: ProblemComposer = ProblemComposer::new(EditorConfig::default());
    let id = composer.store().statement_ids()[0].clone();
    composer.edit(&id, |editor| {
        editor.set_edit_mode(EditMode::Html);
        editor.set_html(html);
        editor.set_edit_mode(EditMode::Rich);
    });
    let version = composer.store().version();

    let changed = composer
        .edit(&id, |editor| {
            editor.select(Selection::collapsed(12));
            assert!(editor.open_link_dialog());
            let dialog = editor.link_dialog().unwrap().clone();
            assert_eq!(dialog.text, "article");
            editor.confirm_link(&dialog.text, &dialog.url)
        })
        .unwrap();

    assert_eq!(changed, Ok(false));
    let statement = composer.store().section(&id).unwrap().body.as_statement().unwrap();
    assert_eq!(statement.content_html, html);
    assert_eq!(composer.store().version(), version);
}

#[test]
fn mode_round_trip_without_edits() {
    let html = "<p>Given an array <code>nums</code>,</p>\n<ul>\n  <li>return <em>indices</em></li>\n</ul>";
    let mut composer: ProblemComposer = ProblemComposer::new(EditorConfig::default());
    let id = composer.store().statement_ids()[0].clone();
    composer.edit(&id, |editor| {
        editor.set_edit_mode(EditMode::Html);
        editor.set_html(html);
    });
    composer.edit(&id, |editor| {
        editor.set_edit_mode(EditMode::Rich);
        editor.set_edit_mode(EditMode::Html);
        editor.set_edit_mode(EditMode::Rich);
    });
    let statement = composer.store().section(&id).unwrap().body.as_statement().unwrap();
    assert_eq!(statement.content_html, html);
    assert_eq!(statement.edit_mode, EditMode::Rich);
}

#[test]
fn html_mode_markup_survives_rich_typing() {
    let html = r#"<p>See <img src="fig.png"> the <span class="note">figure</span></p><table><tr><td>1</td></tr></table>"#;
    let mut composer: ProblemComposer = ProblemComposer::new(EditorConfig::default());
    let id = composer.store().statement_ids()[0].clone();
    composer.edit(&id, |editor| {
        editor.set_edit_mode(EditMode::Html);
        editor.set_html(html);
        editor.set_edit_mode(EditMode::Rich);
        editor.select(Selection::collapsed(0));
        assert!(editor.insert_text("X"));
    });

    let statement = composer.store().section(&id).unwrap().body.as_statement().unwrap();
    assert_eq!(statement.content_html, format!("<p>X{}", &html[3..]));
    assert!(statement.content_html.contains(r#"<img src="fig.png">"#));
}

#[test]
fn authoring_session_publishes_clean_payload() {
    let mut composer: ProblemComposer = ProblemComposer::new(EditorConfig::default());
    composer.set_title("Two Sum");
    composer.add_tag("Hash Table");
    let id = composer.store().statement_ids()[0].clone();

    composer.edit(&id, |editor| {
        for action in [
            EditorAction::SelectAll,
            EditorAction::Insert {
                text: "Return the indices of two numbers adding up to ".to_string(),
            },
            EditorAction::InsertVariable,
            EditorAction::Insert {
                text: ".".to_string(),
            },
        ] {
            execute_action(editor, &action);
        }
    });
    let examples = composer.add_section(SectionKind::Examples).unwrap();
    assert!(composer.add_item(&examples));
    composer.add_section(SectionKind::Hints).unwrap();

    assert!(composer.is_dirty());
    let payload = composer.publish();
    assert!(!composer.is_dirty());
    payload.validate().unwrap();

    let statement = payload.sections[0].body.as_statement().unwrap();
    assert_eq!(
        statement.content_html,
        "<p>Return the indices of two numbers adding up to <code>x</code>.</p>"
    );

    let summary = composer.summary();
    assert_eq!(summary.example_count, 2);
    assert_eq!(summary.hint_count, 1);
    assert_eq!(summary.tags, vec!["hash table"]);
}
