//! Property test: the edit delta exactly transforms old counters into new.

use proptest::prelude::*;
use pulsemap_counters::{counters_by_question, edit_delta, AnswerSet, Counters};
use std::collections::BTreeMap;

/// Small integer-valued answers keep f64 arithmetic exact, so equality
/// assertions are meaningful.
fn answer_set() -> impl Strategy<Value = AnswerSet> {
    prop::collection::btree_map(
        prop::sample::select(vec!["q1", "q2", "q3", "q4"]).prop_map(String::from),
        (-100i32..=100).prop_map(|v| v as f64),
        0..4,
    )
}

/// Snapshot counters over the union key set, treating missing answers as
/// explicit zeros — the same coercion the delta applies.
fn snapshot(answers: &AnswerSet, other: &AnswerSet) -> BTreeMap<String, Counters> {
    let mut full = answers.clone();
    for question in other.keys() {
        full.entry(question.clone()).or_insert(0.0);
    }
    counters_by_question(&full)
}

proptest! {
    #[test]
    fn delta_transforms_old_into_new(old in answer_set(), new in answer_set()) {
        let delta = edit_delta(&old, &new);

        let mut state = snapshot(&old, &new);
        for (question, d) in &delta {
            state.entry(question.clone()).or_default().merge(d);
        }

        let expected = snapshot(&new, &old);
        prop_assert_eq!(state, expected);
    }

    #[test]
    fn delta_is_antisymmetric(old in answer_set(), new in answer_set()) {
        // Reversing the edit negates every per-question delta
        let forward = edit_delta(&old, &new);
        let backward = edit_delta(&new, &old);

        prop_assert_eq!(forward.len(), backward.len());
        for (question, d) in &forward {
            prop_assert_eq!(&d.negated(), &backward[question]);
        }
    }
}
