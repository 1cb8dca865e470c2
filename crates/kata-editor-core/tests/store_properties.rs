use proptest::collection::vec;
use proptest::prelude::*;

use kata_common::{SectionKind, SectionBody};
use kata_editor_core::{MoveDirection, SectionStore};

#[derive(Debug, Clone)]
enum Op {
    Add(SectionKind),
    Move(usize, MoveDirection),
    /// Remove the section at this position (modulo length).
    Remove(usize),
    AddItem(usize),
    RemoveItem(usize, usize),
}

fn kind() -> impl Strategy<Value = SectionKind> {
    prop::sample::select(SectionKind::ALL.to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => kind().prop_map(Op::Add),
        3 => (0usize..12, prop_oneof![Just(MoveDirection::Up), Just(MoveDirection::Down)])
            .prop_map(|(index, direction)| Op::Move(index, direction)),
        2 => (0usize..12).prop_map(Op::Remove),
        1 => (0usize..12).prop_map(Op::AddItem),
        1 => (0usize..12, 0usize..4).prop_map(|(section, item)| Op::RemoveItem(section, item)),
    ]
}

fn apply(store: &mut SectionStore, op: &Op) -> bool {
    let id_at = |store: &SectionStore, index: usize| {
        let len = store.len();
        store.sections()[index % len].id.clone()
    };
    match op {
        Op::Add(kind) => store.add_section(*kind).is_some(),
        Op::Move(index, direction) => store.move_section(*index, *direction),
        Op::Remove(index) => {
            let id = id_at(store, *index);
            store.remove_section(&id)
        }
        Op::AddItem(index) => {
            let id = id_at(store, *index);
            store.add_item(&id)
        }
        Op::RemoveItem(index, item) => {
            let id = id_at(store, *index);
            store.remove_item(&id, *item)
        }
    }
}

fn check_invariants(store: &SectionStore) -> Result<(), TestCaseError> {
    let sections = store.sections();
    prop_assert!(sections.iter().any(|s| s.is_statement()), "no statement left");

    let hints: Vec<usize> = sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_hints())
        .map(|(i, _)| i)
        .collect();
    prop_assert!(hints.len() <= 1, "{} hint sections", hints.len());
    if let Some(&position) = hints.first() {
        prop_assert_eq!(position, sections.len() - 1, "hints not last");
    }

    for section in sections {
        if !matches!(section.body, SectionBody::Statement(_)) {
            prop_assert!(section.body.item_count().unwrap_or(0) >= 1, "empty {}", section.id);
        }
    }

    let mut ids: Vec<&str> = sections.iter().map(|s| s.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    prop_assert_eq!(ids.len(), sections.len(), "duplicate ids");

    prop_assert!(store.to_payload().validate().is_ok());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn invariants_hold_after_every_mutation(ops in vec(op(), 0..60)) {
        let mut store = SectionStore::default();
        check_invariants(&store)?;
        for op in &ops {
            let version = store.version();
            let changed = apply(&mut store, op);
            check_invariants(&store)?;
            // Rejected operations never dirty the document.
            if changed {
                prop_assert_eq!(store.version(), version + 1);
            } else {
                prop_assert_eq!(store.version(), version);
            }
        }
    }

    #[test]
    fn payload_roundtrip_preserves_everything(ops in vec(op(), 0..40)) {
        let mut store = SectionStore::default();
        for op in &ops {
            apply(&mut store, op);
        }
        let payload = store.to_payload();
        let json = payload.to_json().unwrap();
        let parsed = kata_common::ProblemPayload::from_json(&json).unwrap();
        prop_assert_eq!(&parsed, &payload);

        let restored = SectionStore::from_payload(parsed, &Default::default()).unwrap();
        prop_assert_eq!(restored.sections(), store.sections());
    }
}
