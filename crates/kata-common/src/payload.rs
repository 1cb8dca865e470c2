//! Publish payload handed to the problem repository.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{KataError, PayloadError};
use crate::problem::{Difficulty, ProblemMeta, Section, SectionKind, TagSet};

/// Serialized problem: metadata plus the ordered section list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemPayload {
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: TagSet,
    pub sections: Vec<Section>,
}

impl ProblemPayload {
    pub fn new(meta: ProblemMeta, sections: Vec<Section>) -> Self {
        Self {
            title: meta.title,
            difficulty: meta.difficulty,
            tags: meta.tags,
            sections,
        }
    }

    pub fn meta(&self) -> ProblemMeta {
        ProblemMeta {
            title: self.title.clone(),
            difficulty: self.difficulty,
            tags: self.tags.clone(),
        }
    }

    /// Check the structural invariants an editable problem must satisfy.
    pub fn validate(&self) -> Result<(), PayloadError> {
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(&section.id) {
                return Err(PayloadError::DuplicateId {
                    id: section.id.clone(),
                });
            }
            if section.body.item_count() == Some(0) {
                return Err(PayloadError::EmptySection {
                    id: section.id.clone(),
                });
            }
        }

        if !self.sections.iter().any(Section::is_statement) {
            return Err(PayloadError::MissingStatement);
        }

        let hints: Vec<usize> = self
            .sections
            .iter()
            .enumerate()
            .filter(|(_, section)| section.kind() == SectionKind::Hints)
            .map(|(position, _)| position)
            .collect();
        if hints.len() > 1 {
            return Err(PayloadError::DuplicateHints { count: hints.len() });
        }
        if let Some(&position) = hints.first() {
            let len = self.sections.len();
            if position + 1 != len {
                return Err(PayloadError::HintsNotLast {
                    id: self.sections[position].id.clone(),
                    position,
                    len,
                });
            }
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, KataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a payload.
    pub fn from_json(json: &str) -> Result<Self, KataError> {
        let payload: Self = serde_json::from_str(json)?;
        if let Err(err) = payload.validate() {
            tracing::warn!(%err, title = %payload.title, "rejected problem payload");
            return Err(err.into());
        }
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{SectionBody, SectionId};

    fn section(index: u64, kind: SectionKind) -> Section {
        Section::new(SectionId::from_index(index), SectionBody::new(kind, "<p>s</p>"))
    }

    fn payload(sections: Vec<Section>) -> ProblemPayload {
        ProblemPayload::new(ProblemMeta::default(), sections)
    }

    #[test]
    fn test_valid_payload() {
        let p = payload(vec![
            section(0, SectionKind::Statement),
            section(1, SectionKind::Examples),
            section(2, SectionKind::Hints),
        ]);
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn test_missing_statement() {
        let p = payload(vec![section(0, SectionKind::Examples)]);
        assert_eq!(p.validate(), Err(PayloadError::MissingStatement));
    }

    #[test]
    fn test_hints_must_be_last() {
        let p = payload(vec![
            section(0, SectionKind::Statement),
            section(1, SectionKind::Hints),
            section(2, SectionKind::Constraints),
        ]);
        assert_eq!(
            p.validate(),
            Err(PayloadError::HintsNotLast {
                id: SectionId::from_index(1),
                position: 1,
                len: 3,
            })
        );
    }

    #[test]
    fn test_duplicate_hints() {
        let p = payload(vec![
            section(0, SectionKind::Statement),
            section(1, SectionKind::Hints),
            section(2, SectionKind::Hints),
        ]);
        assert_eq!(p.validate(), Err(PayloadError::DuplicateHints { count: 2 }));
    }

    #[test]
    fn test_empty_list_rejected() {
        let mut empty = section(1, SectionKind::Images);
        empty.body = SectionBody::Images { items: vec![] };
        let p = payload(vec![section(0, SectionKind::Statement), empty]);
        assert_eq!(
            p.validate(),
            Err(PayloadError::EmptySection {
                id: SectionId::from_index(1)
            })
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let p = payload(vec![
            section(0, SectionKind::Statement),
            section(0, SectionKind::Constraints),
        ]);
        assert_eq!(
            p.validate(),
            Err(PayloadError::DuplicateId {
                id: SectionId::from_index(0)
            })
        );
    }

    #[test]
    fn test_json_roundtrip_and_tag_folding() {
        let json = r#"{
            "title": "Two Sum",
            "difficulty": "easy",
            "tags": ["Array", "array", "Hash Table"],
            "sections": [
                {"id": "sec-0", "type": "statement", "edit_mode": "html", "content_html": "<p>Find two numbers.</p>"},
                {"id": "sec-1", "type": "examples", "items": [{"input": "[2,7]", "output": "[0,1]", "explanation": ""}]}
            ]
        }"#;
        let p = ProblemPayload::from_json(json).unwrap();
        assert_eq!(p.tags.iter().collect::<Vec<_>>(), vec!["array", "hash table"]);
        assert_eq!(p.sections.len(), 2);

        let again = ProblemPayload::from_json(&p.to_json().unwrap()).unwrap();
        assert_eq!(again, p);
    }

    #[test]
    fn test_from_json_reports_invariant_errors() {
        let json = r#"{"title": "", "difficulty": "hard", "sections": []}"#;
        let err = ProblemPayload::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            KataError::Payload(PayloadError::MissingStatement)
        ));
    }
}
