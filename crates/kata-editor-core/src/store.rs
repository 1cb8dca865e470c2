//! The section store: ordered sections plus problem metadata.
//!
//! Every structural mutation re-normalizes the sequence, so the document
//! invariants hold after each call:
//! - at least one statement section exists
//! - at most one hints section exists, and it is the last section
//! - list sections never drop to zero items
//!
//! Structural failures are reported as `false`/`None` so callers can drive
//! button state from the same queries (`can_add`, `can_remove`, `can_move`).
//! The only fallible entry point is [`SectionStore::from_payload`], because
//! payloads come from outside.

use kata_common::{
    Difficulty, EditorConfig, PayloadError, ProblemMeta, ProblemPayload, Section, SectionBody,
    SectionId, SectionKind,
};

/// Direction of a single-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    /// Map a raw delta (`-1`/`+1`) to a direction.
    pub fn from_delta(delta: i32) -> Option<Self> {
        match delta {
            -1 => Some(Self::Up),
            1 => Some(Self::Down),
            _ => None,
        }
    }

    pub fn delta(self) -> isize {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }
}

/// Stable partition pinning the hints section last.
///
/// Relative order of everything else is kept. Pure, so it can be applied to
/// candidate orders before committing them.
pub fn normalize(sections: Vec<Section>) -> Vec<Section> {
    let (mut rest, hints): (Vec<Section>, Vec<Section>) =
        sections.into_iter().partition(|section| !section.is_hints());
    rest.extend(hints);
    rest
}

/// Authoritative state of the problem being authored.
#[derive(Debug, Clone)]
pub struct SectionStore {
    meta: ProblemMeta,
    sections: Vec<Section>,
    next_id: u64,
    statement_template: String,
    version: u64,
    saved_version: u64,
}

impl Default for SectionStore {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl SectionStore {
    /// A fresh document: one default statement, empty title, easy, no tags.
    pub fn new(config: &EditorConfig) -> Self {
        let mut store = Self {
            meta: ProblemMeta::default(),
            sections: Vec::new(),
            next_id: 1,
            statement_template: config.statement_template.clone(),
            version: 0,
            saved_version: 0,
        };
        store.sections.push(Section::new(
            SectionId::from_index(0),
            SectionBody::statement(store.statement_template.clone()),
        ));
        store
    }

    /// Rebuild a store from a published payload.
    ///
    /// The payload is validated first; ids are kept and the id counter resumes
    /// past the highest `sec-{n}` id found, which therefore must leave room for
    /// one more. The result starts clean.
    pub fn from_payload(
        payload: ProblemPayload,
        config: &EditorConfig,
    ) -> Result<Self, PayloadError> {
        payload.validate()?;
        let meta = payload.meta();
        let highest = payload
            .sections
            .iter()
            .filter_map(|section| section.id.index().map(|index| (index, &section.id)))
            .max_by_key(|(index, _)| *index);
        let next_id = match highest {
            Some((index, id)) => index
                .checked_add(1)
                .ok_or_else(|| PayloadError::IdOutOfRange { id: id.clone() })?,
            None => 0,
        };
        tracing::debug!(sections = payload.sections.len(), "store loaded from payload");
        Ok(Self {
            meta,
            sections: payload.sections,
            next_id,
            statement_template: config.statement_template.clone(),
            version: 0,
            saved_version: 0,
        })
    }

    pub fn to_payload(&self) -> ProblemPayload {
        ProblemPayload::new(self.meta.clone(), self.sections.clone())
    }

    /// Next `sec-{n}` id, `None` once the counter is exhausted.
    fn allocate_id(&mut self) -> Option<SectionId> {
        let index = self.next_id;
        self.next_id = index.checked_add(1)?;
        Some(SectionId::from_index(index))
    }

    fn touch(&mut self) {
        self.version += 1;
    }

    // === Queries ===

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn meta(&self) -> &ProblemMeta {
        &self.meta
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| &section.id == id)
    }

    pub fn position(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|section| &section.id == id)
    }

    pub fn statement_ids(&self) -> Vec<SectionId> {
        self.sections
            .iter()
            .filter(|section| section.is_statement())
            .map(|section| section.id.clone())
            .collect()
    }

    fn count_kind(&self, kind: SectionKind) -> usize {
        self.sections
            .iter()
            .filter(|section| section.kind() == kind)
            .count()
    }

    // === Dirty tracking ===

    /// Bumped by every effective mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Version at the last publish.
    pub fn saved_version(&self) -> u64 {
        self.saved_version
    }

    pub fn is_dirty(&self) -> bool {
        self.version != self.saved_version
    }

    pub fn mark_saved(&mut self) {
        self.saved_version = self.version;
    }

    // === UI enablement ===

    pub fn can_add(&self, kind: SectionKind) -> bool {
        kind != SectionKind::Hints || self.count_kind(SectionKind::Hints) == 0
    }

    pub fn can_remove(&self, id: &SectionId) -> bool {
        match self.section(id) {
            Some(section) if section.is_statement() => {
                self.count_kind(SectionKind::Statement) > 1
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn can_move(&self, index: usize, direction: MoveDirection) -> bool {
        self.moved_order(index, direction).is_some()
    }

    /// The normalized order after a move, or `None` if the move has no effect.
    fn moved_order(&self, index: usize, direction: MoveDirection) -> Option<Vec<Section>> {
        let target = index.checked_add_signed(direction.delta())?;
        if index >= self.sections.len() || target >= self.sections.len() {
            return None;
        }
        if self.sections[index].is_hints() {
            return None;
        }
        let mut candidate = self.sections.clone();
        candidate.swap(index, target);
        let candidate = normalize(candidate);
        let unchanged = candidate
            .iter()
            .zip(&self.sections)
            .all(|(a, b)| a.id == b.id);
        (!unchanged).then_some(candidate)
    }

    // === Structural mutations ===

    /// Append a default section of `kind`.
    ///
    /// Returns `None` when a hints section is requested and one already exists.
    pub fn add_section(&mut self, kind: SectionKind) -> Option<SectionId> {
        if !self.can_add(kind) {
            tracing::debug!(%kind, "add rejected");
            return None;
        }
        let Some(id) = self.allocate_id() else {
            tracing::warn!(%kind, "section ids exhausted");
            return None;
        };
        let body = SectionBody::new(kind, &self.statement_template);
        let mut sections = std::mem::take(&mut self.sections);
        sections.push(Section::new(id.clone(), body));
        self.sections = normalize(sections);
        self.touch();
        tracing::debug!(%kind, %id, "section added");
        Some(id)
    }

    /// Swap the section at `index` with its neighbour.
    ///
    /// Out-of-range moves and moves that normalization would undo (anything
    /// involving the hints section) return false and leave the store clean.
    pub fn move_section(&mut self, index: usize, direction: MoveDirection) -> bool {
        match self.moved_order(index, direction) {
            Some(order) => {
                self.sections = order;
                self.touch();
                tracing::debug!(index, ?direction, "section moved");
                true
            }
            None => false,
        }
    }

    /// Remove a section. The last remaining statement cannot be removed.
    pub fn remove_section(&mut self, id: &SectionId) -> bool {
        if !self.can_remove(id) {
            tracing::debug!(%id, "remove rejected");
            return false;
        }
        let sections = std::mem::take(&mut self.sections);
        self.sections = normalize(
            sections
                .into_iter()
                .filter(|section| &section.id != id)
                .collect(),
        );
        self.touch();
        tracing::debug!(%id, "section removed");
        true
    }

    /// Replace a section's body with `updater(body)`.
    ///
    /// Rejects updates that change the section kind. An update that yields
    /// an identical body is not a mutation and returns false.
    pub fn update_section_field<F>(&mut self, id: &SectionId, updater: F) -> bool
    where
        F: FnOnce(SectionBody) -> SectionBody,
    {
        let Some(section) = self.sections.iter_mut().find(|section| &section.id == id) else {
            return false;
        };
        let updated = updater(section.body.clone());
        if updated.kind() != section.body.kind() {
            tracing::debug!(%id, from = %section.body.kind(), to = %updated.kind(), "kind change rejected");
            return false;
        }
        if updated == section.body {
            return false;
        }
        section.body = updated;
        self.touch();
        true
    }

    pub fn add_item(&mut self, id: &SectionId) -> bool {
        self.update_section_field(id, |mut body| {
            body.push_default_item();
            body
        })
    }

    /// Remove one list item. Refuses to drop the last one.
    pub fn remove_item(&mut self, id: &SectionId, index: usize) -> bool {
        self.update_section_field(id, |mut body| {
            body.remove_item(index);
            body
        })
    }

    // === Metadata ===

    pub fn set_title(&mut self, title: &str) -> bool {
        if self.meta.title == title {
            return false;
        }
        self.meta.title = title.to_string();
        self.touch();
        true
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> bool {
        if self.meta.difficulty == difficulty {
            return false;
        }
        self.meta.difficulty = difficulty;
        self.touch();
        true
    }

    /// Add a tag; blank and duplicate tags are ignored.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let added = self.meta.tags.insert(tag);
        if added {
            self.touch();
        }
        added
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let removed = self.meta.tags.remove(tag);
        if removed {
            self.touch();
        }
        removed
    }
}
