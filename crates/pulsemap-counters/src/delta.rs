//! From-scratch counters and bucket-aware edit deltas.

use crate::counters::{Bucket, Counters};
use std::collections::{BTreeMap, BTreeSet};

/// Question identifier.
pub type QuestionId = String;

/// A respondent's answers: question id to numeric value.
///
/// A `BTreeMap` keeps iteration deterministic, so repeated aggregation of
/// the same data folds in the same order.
pub type AnswerSet = BTreeMap<QuestionId, f64>;

/// Coerce a raw answer value: non-finite values count as zero.
pub fn coerce(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// From-scratch counters for a full answer set, one entry per question.
///
/// Used when a respondent is newly counted or entirely removed; equivalent
/// to an edit delta against an empty answer set.
pub fn counters_by_question(answers: &AnswerSet) -> BTreeMap<QuestionId, Counters> {
    let mut by_question = BTreeMap::new();
    for (question, &raw) in answers {
        by_question.insert(question.clone(), Counters::from_value(coerce(raw)));
    }
    by_question
}

/// Per-question delta transforming the aggregate of `old` into that of `new`.
///
/// For each question present in either snapshot (missing values coerce to
/// zero):
/// - a 0 -> 0 non-change contributes nothing;
/// - `sum` always moves by `after - before`;
/// - if the sign bucket changed, the old value leaves its bucket (sub-sum
///   and count) and the new value enters its bucket — the zero bucket has a
///   count but no sub-sum;
/// - if the bucket is unchanged, only that bucket's sub-sum moves.
///
/// Naively adding `after - before` to the bucket fields would corrupt the
/// counts whenever a value crosses sign or crosses to/from zero.
pub fn edit_delta(old: &AnswerSet, new: &AnswerSet) -> BTreeMap<QuestionId, Counters> {
    let questions: BTreeSet<&QuestionId> = old.keys().chain(new.keys()).collect();

    let mut delta = BTreeMap::new();
    for question in questions {
        let before = coerce(old.get(question).copied().unwrap_or(0.0));
        let after = coerce(new.get(question).copied().unwrap_or(0.0));
        if before == 0.0 && after == 0.0 {
            continue;
        }

        let mut d = Counters {
            sum: after - before,
            ..Counters::default()
        };

        let b = Bucket::of(before);
        let a = Bucket::of(after);
        if b != a {
            match b {
                Bucket::Pos => {
                    d.pos_sum -= before;
                    d.pos_count -= 1;
                }
                Bucket::Neg => {
                    d.neg_sum -= before;
                    d.neg_count -= 1;
                }
                Bucket::Zero => d.zero_count -= 1,
            }
            match a {
                Bucket::Pos => {
                    d.pos_sum += after;
                    d.pos_count += 1;
                }
                Bucket::Neg => {
                    d.neg_sum += after;
                    d.neg_count += 1;
                }
                Bucket::Zero => d.zero_count += 1,
            }
        } else {
            match a {
                Bucket::Pos => d.pos_sum += after - before,
                Bucket::Neg => d.neg_sum += after - before,
                // Same-bucket zero edits were skipped above
                Bucket::Zero => {}
            }
        }

        if !d.is_zero() {
            delta.insert(question.clone(), d);
        }
    }
    delta
}
