//! Pulsemap Counters
//!
//! Sign-bucketed counter aggregates and the incremental delta computation
//! that keeps them correct under edits.
//!
//! # Design
//!
//! Every answered question contributes to exactly one of three sign buckets:
//! positive (> 0), negative (< 0), or zero. A [`Counters`] value tracks the
//! overall sum, the per-bucket sub-sums, and the per-bucket counts, so a map
//! view can distinguish "ten people at +1" from "one person at +10".
//!
//! The crux is [`edit_delta`]: when a respondent changes an answer, the sum
//! moves by `after - before`, but bucket counts and sub-sums only move when
//! the value crosses between buckets. Adding the resulting delta to the
//! counters of the old answer set yields exactly the counters of the new
//! one, which is what lets many writers apply commutative increments to a
//! shared aggregate without reading it first.

mod counters;
mod delta;

pub use counters::{Bucket, Counters};
pub use delta::{coerce, counters_by_question, edit_delta, AnswerSet, QuestionId};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_classification() {
        assert_eq!(Bucket::of(5.0), Bucket::Pos);
        assert_eq!(Bucket::of(-0.5), Bucket::Neg);
        assert_eq!(Bucket::of(0.0), Bucket::Zero);
        // -0.0 == 0.0 in IEEE comparisons
        assert_eq!(Bucket::of(-0.0), Bucket::Zero);
    }
}
