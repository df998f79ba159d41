//! Persisted data models.

use crate::error::{Error, Result};
use crate::keys::{FIELD_RESPONDENTS, FIELD_UPDATED_AT};
use pulsemap_counters::{AnswerSet, Counters, QuestionId};
use pulsemap_grid::CellId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// One respondent's submission to one poll.
///
/// Written by the ingest path; the engine consumes the before/after pair of
/// each write and the rollup scans the submitted set. Only documents with
/// `submitted == true` contribute to aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub poll_id: String,
    pub user_id: String,
    pub submitted: bool,
    /// Question id to numeric answer.
    #[serde(default)]
    pub answers: AnswerSet,
    /// Respondent coordinates, if the profile service provided them.
    #[serde(default)]
    pub location: Option<GeoPoint>,
    /// Pre-resolved cell stamp; preferred over `location` when present.
    #[serde(default)]
    pub cell: Option<CellId>,
    pub updated_at_ms: u64,
}

/// Rollup bookkeeping for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollRollupState {
    /// Writes have landed since the last successful rollup.
    pub dirty: bool,
    pub last_submission_at_ms: Option<u64>,
    pub last_rolled_at_ms: Option<u64>,
}

/// A signed aggregate change to apply to one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellDelta {
    /// Per-question counter increments.
    pub stats: BTreeMap<QuestionId, Counters>,
    /// Change to the cell's respondent count (-1, 0, or +1 per transition).
    pub respondents: i64,
}

impl CellDelta {
    /// A delta that would change nothing.
    pub fn is_empty(&self) -> bool {
        self.respondents == 0 && self.stats.values().all(Counters::is_zero)
    }

    /// The nonzero field increments of this delta, as key-suffix/value
    /// pairs matching the storage layout.
    pub fn field_increments(&self) -> Vec<(String, f64)> {
        let mut fields = Vec::new();
        for (question, c) in &self.stats {
            for (name, value) in counter_fields(c) {
                if value != 0.0 {
                    fields.push((format!("q:{question}:{name}"), value));
                }
            }
        }
        if self.respondents != 0 {
            fields.push((FIELD_RESPONDENTS.to_string(), self.respondents as f64));
        }
        fields
    }
}

/// Materialized aggregate state of one cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateCell {
    /// Per-question counters.
    pub stats: BTreeMap<QuestionId, Counters>,
    /// Distinct respondents contributing to this cell (cardinality, not a
    /// per-question sum).
    pub total_respondents: i64,
    pub updated_at_ms: u64,
}

impl AggregateCell {
    /// Every counter field of this cell as key-suffix/value pairs, for a
    /// full (replace) write.
    pub fn field_values(&self) -> Vec<(String, f64)> {
        let mut fields = Vec::new();
        for (question, c) in &self.stats {
            for (name, value) in counter_fields(c) {
                fields.push((format!("q:{question}:{name}"), value));
            }
        }
        fields.push((FIELD_RESPONDENTS.to_string(), self.total_respondents as f64));
        fields.push((FIELD_UPDATED_AT.to_string(), self.updated_at_ms as f64));
        fields
    }

    /// Fold one scanned field into this cell.
    pub fn apply_field(&mut self, suffix: &str, value: f64) -> Result<()> {
        match suffix {
            FIELD_RESPONDENTS => self.total_respondents = value.round() as i64,
            FIELD_UPDATED_AT => self.updated_at_ms = value as u64,
            _ => {
                let mut parts = suffix.splitn(3, ':');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some("q"), Some(question), Some(field)) => {
                        let counters = self.stats.entry(question.to_string()).or_default();
                        set_counter_field(counters, field, value)?;
                    }
                    _ => {
                        return Err(Error::CorruptRecord(format!("field suffix {suffix:?}")));
                    }
                }
            }
        }
        Ok(())
    }

    /// True if the cell holds no contributions at all (every counter zero
    /// and no respondents) — e.g. after increments fully cancelled out.
    pub fn is_empty(&self) -> bool {
        self.total_respondents == 0 && self.stats.values().all(Counters::is_zero)
    }
}

/// The six counter fields by their storage names (matches the wire shape).
fn counter_fields(c: &Counters) -> [(&'static str, f64); 6] {
    [
        ("sum", c.sum),
        ("posSum", c.pos_sum),
        ("negSum", c.neg_sum),
        ("posCount", c.pos_count as f64),
        ("negCount", c.neg_count as f64),
        ("zeroCount", c.zero_count as f64),
    ]
}

fn set_counter_field(c: &mut Counters, field: &str, value: f64) -> Result<()> {
    match field {
        "sum" => c.sum = value,
        "posSum" => c.pos_sum = value,
        "negSum" => c.neg_sum = value,
        "posCount" => c.pos_count = value.round() as i64,
        "negCount" => c.neg_count = value.round() as i64,
        "zeroCount" => c.zero_count = value.round() as i64,
        _ => return Err(Error::CorruptRecord(format!("counter field {field:?}"))),
    }
    Ok(())
}
