use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use switchyard_graph::{AppendVec, GraphState, MergeMap, Override, StateSchema, StateUpdate};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
struct MergeState {
    messages: Vec<String>,
    results: BTreeMap<String, String>,
    note: Option<String>,
}

impl StateSchema for MergeState {
    fn merge(current: &Self, update: Self) -> Self {
        Self {
            messages: AppendVec::merge(&current.messages, update.messages),
            results: MergeMap::merge(&current.results, update.results),
            note: Override::merge(&current.note, update.note),
        }
    }
}

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
struct OverrideState {
    count: i32,
}

impl StateSchema for OverrideState {}

#[test]
fn state_merge_appends_and_merges() {
    let base = GraphState::new(MergeState {
        messages: vec!["a".to_string()],
        results: BTreeMap::from([("research".to_string(), "old".to_string())]),
        note: Some("keep".to_string()),
    });
    let update = StateUpdate::new(MergeState {
        messages: vec!["b".to_string(), "c".to_string()],
        results: BTreeMap::from([
            ("research".to_string(), "new".to_string()),
            ("analysis".to_string(), "done".to_string()),
        ]),
        note: None,
    });

    let merged = base.apply_update(update);
    assert_eq!(merged.data.messages, vec!["a", "b", "c"]);
    assert_eq!(merged.data.results["research"], "new");
    assert_eq!(merged.data.results.len(), 2);
    assert_eq!(merged.data.note.as_deref(), Some("keep"));
}

#[test]
fn state_merge_defaults_to_override() {
    let base = GraphState::new(OverrideState { count: 1 });
    let merged = base.apply_update(StateUpdate::new(OverrideState { count: 9 }));
    assert_eq!(merged.data.count, 9);
}
