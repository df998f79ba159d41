//! Counter aggregate state.

use serde::{Deserialize, Serialize};

/// Sign bucket of an answer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Pos,
    Neg,
    Zero,
}

impl Bucket {
    /// Classify a value into its sign bucket.
    pub fn of(v: f64) -> Self {
        if v > 0.0 {
            Bucket::Pos
        } else if v < 0.0 {
            Bucket::Neg
        } else {
            Bucket::Zero
        }
    }
}

/// Aggregate counters for one question in one cell.
///
/// Invariants for counters built from a set of values:
/// - `sum == pos_sum + neg_sum`
/// - `pos_count + neg_count + zero_count` equals the number of values
/// - each bucket's sub-sum covers exactly the values classified into it
///
/// The same shape doubles as a signed delta ("what to add"), in which case
/// individual fields may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Counters {
    pub sum: f64,
    pub pos_sum: f64,
    pub neg_sum: f64,
    pub pos_count: i64,
    pub neg_count: i64,
    pub zero_count: i64,
}

impl Counters {
    /// Counters for a single value.
    pub fn from_value(v: f64) -> Self {
        let mut c = Self::default();
        c.observe(v);
        c
    }

    /// Fold one value into these counters.
    pub fn observe(&mut self, v: f64) {
        self.sum += v;
        match Bucket::of(v) {
            Bucket::Pos => {
                self.pos_sum += v;
                self.pos_count += 1;
            }
            Bucket::Neg => {
                self.neg_sum += v;
                self.neg_count += 1;
            }
            Bucket::Zero => {
                self.zero_count += 1;
            }
        }
    }

    /// Add another counters value field-by-field (delta application).
    pub fn merge(&mut self, other: &Self) {
        self.sum += other.sum;
        self.pos_sum += other.pos_sum;
        self.neg_sum += other.neg_sum;
        self.pos_count += other.pos_count;
        self.neg_count += other.neg_count;
        self.zero_count += other.zero_count;
    }

    /// The field-wise negation, used to remove a contribution.
    pub fn negated(&self) -> Self {
        Self {
            sum: -self.sum,
            pos_sum: -self.pos_sum,
            neg_sum: -self.neg_sum,
            pos_count: -self.pos_count,
            neg_count: -self.neg_count,
            zero_count: -self.zero_count,
        }
    }

    /// True if every field is zero (a no-op delta).
    pub fn is_zero(&self) -> bool {
        self.sum == 0.0
            && self.pos_sum == 0.0
            && self.neg_sum == 0.0
            && self.pos_count == 0
            && self.neg_count == 0
            && self.zero_count == 0
    }
}
