//! Page-level binding between the section store and statement editors.
//!
//! The composer owns the [`SectionStore`] and one [`RichTextEditor`] per
//! statement section. Editors are the only writers of statement HTML; every
//! editor call made through [`ProblemComposer::edit`] is forwarded to the
//! store, so the store (and every preview built from it) always reflects
//! what the author sees.

use std::collections::BTreeMap;

use kata_common::{
    Difficulty, EditorConfig, PayloadError, ProblemPayload, Section, SectionBody, SectionId,
    SectionKind,
};
use kata_renderer::{SummaryPreview, render_problem_html};

use crate::block::BlockSurface;
use crate::editor::RichTextEditor;
use crate::store::{MoveDirection, SectionStore};
use crate::surface::RichTextSurface;

pub struct ProblemComposer<S = BlockSurface> {
    store: SectionStore,
    editors: BTreeMap<SectionId, RichTextEditor<S>>,
    config: EditorConfig,
}

impl<S: RichTextSurface + Default> ProblemComposer<S> {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_store(SectionStore::new(&config), config)
    }

    /// Resume editing a published problem.
    pub fn from_payload(payload: ProblemPayload, config: EditorConfig) -> Result<Self, PayloadError> {
        let store = SectionStore::from_payload(payload, &config)?;
        Ok(Self::with_store(store, config))
    }

    fn with_store(store: SectionStore, config: EditorConfig) -> Self {
        let mut composer = Self {
            store,
            editors: BTreeMap::new(),
            config,
        };
        let sections: Vec<Section> = composer.store.sections().to_vec();
        for section in &sections {
            composer.attach_editor(section);
        }
        composer
    }

    fn attach_editor(&mut self, section: &Section) {
        if let SectionBody::Statement(statement) = &section.body {
            let editor = RichTextEditor::new(S::default(), statement, &self.config);
            self.editors.insert(section.id.clone(), editor);
        }
    }

    pub fn store(&self) -> &SectionStore {
        &self.store
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn editor(&self, id: &SectionId) -> Option<&RichTextEditor<S>> {
        self.editors.get(id)
    }

    /// Run `f` against a statement editor and forward the result to the store.
    pub fn edit<R>(&mut self, id: &SectionId, f: impl FnOnce(&mut RichTextEditor<S>) -> R) -> Option<R> {
        let editor = self.editors.get_mut(id)?;
        let result = f(editor);
        let statement = editor.statement();
        self.store.update_section_field(id, |body| match body {
            SectionBody::Statement(_) => SectionBody::Statement(statement),
            other => other,
        });
        Some(result)
    }

    // === Structure ===

    pub fn add_section(&mut self, kind: SectionKind) -> Option<SectionId> {
        let id = self.store.add_section(kind)?;
        if let Some(section) = self.store.section(&id).cloned() {
            self.attach_editor(&section);
        }
        Some(id)
    }

    pub fn remove_section(&mut self, id: &SectionId) -> bool {
        let removed = self.store.remove_section(id);
        if removed {
            self.editors.remove(id);
        }
        removed
    }

    pub fn move_section(&mut self, index: usize, direction: MoveDirection) -> bool {
        self.store.move_section(index, direction)
    }

    /// Update a section body directly.
    ///
    /// Statement bodies written this way replace the editor's contents and
    /// history.
    pub fn update_section_field<F>(&mut self, id: &SectionId, updater: F) -> bool
    where
        F: FnOnce(SectionBody) -> SectionBody,
    {
        let updated = self.store.update_section_field(id, updater);
        if updated {
            if let Some(section) = self.store.section(id).cloned() {
                self.attach_editor(&section);
            }
        }
        updated
    }

    pub fn add_item(&mut self, id: &SectionId) -> bool {
        self.store.add_item(id)
    }

    pub fn remove_item(&mut self, id: &SectionId, index: usize) -> bool {
        self.store.remove_item(id, index)
    }

    // === Metadata ===

    pub fn set_title(&mut self, title: &str) -> bool {
        self.store.set_title(title)
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        self.store.set_difficulty(difficulty)
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        self.store.add_tag(tag)
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.store.remove_tag(tag)
    }

    // === Output ===

    pub fn summary(&self) -> SummaryPreview {
        SummaryPreview::build(self.store.meta(), self.store.sections(), &self.config)
    }

    pub fn preview_html(&self) -> String {
        render_problem_html(self.store.meta(), self.store.sections())
    }

    /// Hand the problem over for publishing and mark it clean.
    pub fn publish(&mut self) -> ProblemPayload {
        let payload = self.store.to_payload();
        self.store.mark_saved();
        tracing::info!(
            title = %payload.title,
            sections = payload.sections.len(),
            "problem published"
        );
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::InlineMark;
    use crate::types::Selection;
    use kata_common::EditMode;

    fn composer() -> ProblemComposer {
        ProblemComposer::new(EditorConfig::default())
    }

    #[test]
    fn test_editor_changes_reach_the_store() {
        let mut composer = composer();
        let id = composer.store().statement_ids()[0].clone();
        composer.edit(&id, |editor| {
            editor.select(Selection::new(0, 8));
            editor.toggle_inline(InlineMark::Bold);
        });
        let statement = composer.store().section(&id).unwrap().body.as_statement().unwrap();
        assert_eq!(statement.content_html, "<p><b>Describe</b> the problem here.</p>");
        assert!(composer.is_dirty());
    }

    #[test]
    fn test_selection_only_edit_keeps_store_clean() {
        let mut composer = composer();
        let id = composer.store().statement_ids()[0].clone();
        composer.edit(&id, |editor| editor.select(Selection::collapsed(0)));
        assert!(!composer.is_dirty());
    }

    #[test]
    fn test_mode_switch_is_forwarded() {
        let mut composer = composer();
        let id = composer.store().statement_ids()[0].clone();
        composer.edit(&id, |editor| editor.set_edit_mode(EditMode::Html));
        let statement = composer.store().section(&id).unwrap().body.as_statement().unwrap();
        assert_eq!(statement.edit_mode, EditMode::Html);
        assert_eq!(statement.content_html, "<p>Describe the problem here.</p>");
    }

    #[test]
    fn test_editors_follow_structure() {
        let mut composer = composer();
        let first = composer.store().statement_ids()[0].clone();
        let second = composer.add_section(SectionKind::Statement).unwrap();
        let examples = composer.add_section(SectionKind::Examples).unwrap();
        assert!(composer.editor(&second).is_some());
        assert!(composer.editor(&examples).is_none());
        assert!(composer.edit(&examples, |_| ()).is_none());

        assert!(composer.remove_section(&first));
        assert!(composer.editor(&first).is_none());
        assert!(!composer.remove_section(&second));
    }

    #[test]
    fn test_publish_marks_clean() {
        let mut composer = composer();
        composer.set_title("Two Sum");
        composer.add_tag("Array");
        let payload = composer.publish();
        assert_eq!(payload.title, "Two Sum");
        assert!(payload.tags.contains("array"));
        assert!(!composer.is_dirty());
    }

    #[test]
    fn test_previews_follow_edits() {
        let mut composer = composer();
        let id = composer.store().statement_ids()[0].clone();
        composer.edit(&id, |editor| {
            editor.select_all();
            editor.insert_text("Add two numbers.");
        });
        assert_eq!(composer.summary().statement_excerpt, "Add two numbers.");
        assert!(composer.preview_html().contains("<p>Add two numbers.</p>"));
    }

    #[test]
    fn test_replaced_statement_starts_a_fresh_history() {
        let mut composer = composer();
        let id = composer.store().statement_ids()[0].clone();
        composer.edit(&id, |editor| editor.insert_text("!"));
        assert!(composer.editor(&id).unwrap().can_undo());

        assert!(composer.update_section_field(&id, |_| SectionBody::statement("<p>New</p>")));
        let editor = composer.editor(&id).unwrap();
        assert_eq!(editor.html(), "<p>New</p>");
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_resume_from_payload() {
        let mut original = composer();
        original.add_section(SectionKind::Hints);
        let payload = original.publish();

        let resumed: ProblemComposer = ProblemComposer::from_payload(payload.clone(), EditorConfig::default()).unwrap();
        assert_eq!(resumed.store().to_payload(), payload);
        let id = resumed.store().statement_ids()[0].clone();
        assert_eq!(resumed.editor(&id).unwrap().html(), "<p>Describe the problem here.</p>");
    }
}
