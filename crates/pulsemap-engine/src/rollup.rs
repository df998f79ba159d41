//! Authoritative multi-resolution rebuild.

use crate::aggregator::resolve_base_cell;
use crate::error::{Error, Result};
use crate::ladder::ResolutionLadder;
use pulsemap_counters::{counters_by_question, Counters, QuestionId};
use pulsemap_grid::CellId;
use pulsemap_store::{is_valid_id, AggregateCell, AggregateStore};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Outcome of one rollup pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupSummary {
    pub poll_id: String,
    /// Submission documents scanned.
    pub submissions_scanned: usize,
    /// Submitted documents that resolved to a cell and were counted.
    pub respondents_counted: usize,
    /// Submitted documents skipped for lack of a resolvable location.
    pub skipped_unresolvable: usize,
    /// Cells written per resolution level.
    pub cells_by_level: BTreeMap<u8, usize>,
}

/// Rebuilds every aggregate layer of a poll from its raw submissions.
///
/// The rebuild is a pure function of the submission set, so running it twice
/// (or concurrently with incremental writes it then supersedes) converges on
/// the same layers. One rollup per poll at a time; different polls are
/// independent.
pub struct RollupEngine {
    store: Arc<dyn AggregateStore>,
    ladder: ResolutionLadder,
    in_flight: Mutex<HashSet<String>>,
}

impl RollupEngine {
    pub fn new(store: Arc<dyn AggregateStore>, ladder: ResolutionLadder) -> Self {
        Self {
            store,
            ladder,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Rebuild all layers of one poll and clear its dirty flag.
    pub fn rollup(&self, poll: &str) -> Result<RollupSummary> {
        if !is_valid_id(poll) {
            return Err(Error::InvalidArgument(format!("poll id {poll:?}")));
        }
        let _guard = self.acquire(poll)?;

        let subs = self.store.list_submissions(poll)?;
        let mut summary = RollupSummary {
            poll_id: poll.to_string(),
            submissions_scanned: subs.len(),
            respondents_counted: 0,
            skipped_unresolvable: 0,
            cells_by_level: BTreeMap::new(),
        };

        let mut layers: BTreeMap<u8, BTreeMap<CellId, LayerCell>> = BTreeMap::new();
        // Stamp rebuilt cells with the latest contributing write, not the
        // wall clock, so a rebuild is a pure function of the submission set.
        let mut rebuilt_at = 0u64;
        for sub in &subs {
            if !sub.submitted {
                continue;
            }
            let Some(base_cell) = resolve_base_cell(sub, self.ladder.base()) else {
                warn!(poll, user = %sub.user_id, "unresolvable location, skipped in rollup");
                summary.skipped_unresolvable += 1;
                continue;
            };
            summary.respondents_counted += 1;
            rebuilt_at = rebuilt_at.max(sub.updated_at_ms);

            let counters = counters_by_question(&sub.answers);
            for &level in self.ladder.levels() {
                let cell = base_cell
                    .ancestor_at(level)
                    .map_err(|e| Error::Internal(e.to_string()))?;
                let entry = layers.entry(level).or_default().entry(cell).or_default();
                // Submissions are keyed per user, so each scan row is one
                // distinct respondent.
                entry.respondents += 1;
                for (question, c) in &counters {
                    entry.stats.entry(question.clone()).or_default().merge(c);
                }
            }
        }

        for &level in self.ladder.levels() {
            let cells: Vec<(CellId, AggregateCell)> = layers
                .remove(&level)
                .unwrap_or_default()
                .into_iter()
                .map(|(cell, acc)| {
                    (
                        cell,
                        AggregateCell {
                            stats: acc.stats,
                            total_respondents: acc.respondents,
                            updated_at_ms: rebuilt_at,
                        },
                    )
                })
                .collect();
            summary.cells_by_level.insert(level, cells.len());
            self.store.replace_layer(poll, level, &cells)?;
        }
        self.store.clear_dirty(poll)?;

        info!(
            poll,
            scanned = summary.submissions_scanned,
            counted = summary.respondents_counted,
            skipped = summary.skipped_unresolvable,
            "rollup complete"
        );
        Ok(summary)
    }

    fn acquire(&self, poll: &str) -> Result<InFlightGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .map_err(|_| Error::Internal("in-flight lock poisoned".into()))?;
        if !in_flight.insert(poll.to_string()) {
            return Err(Error::RollupInProgress(poll.to_string()));
        }
        Ok(InFlightGuard {
            engine: self,
            poll: poll.to_string(),
        })
    }
}

/// Per-cell accumulator for one layer under construction.
#[derive(Debug, Default)]
struct LayerCell {
    stats: BTreeMap<QuestionId, Counters>,
    respondents: i64,
}

struct InFlightGuard<'a> {
    engine: &'a RollupEngine,
    poll: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.engine.in_flight.lock() {
            in_flight.remove(&self.poll);
        }
    }
}
