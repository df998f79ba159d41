//! Incremental aggregation on submission writes.
//!
//! The ingest path persists a submission document and then hands the
//! before/after pair to [`ResponseAggregator::on_response_written`], which
//! translates the transition into counter increments on the base-resolution
//! cell. Coarser layers are only touched by the rollup.

use crate::error::Result;
use crate::ladder::ResolutionLadder;
use pulsemap_counters::{counters_by_question, edit_delta, Counters};
use pulsemap_grid::CellId;
use pulsemap_store::{AggregateStore, CellDelta, Submission};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// The base-resolution cell a submission contributes to, if any.
///
/// The submission's own cell stamp wins when it is at least as fine as the
/// base resolution (taking its ancestor at base). A coarser stamp cannot be
/// refined, so coordinates are the fallback; with neither, the submission
/// does not resolve.
pub fn resolve_base_cell(sub: &Submission, base: u8) -> Option<CellId> {
    if let Some(stamp) = sub.cell {
        if stamp.res >= base {
            if let Ok(cell) = stamp.ancestor_at(base) {
                return Some(cell);
            }
        }
    }
    let loc = sub.location?;
    CellId::at(loc.lat, loc.lng, base).ok()
}

/// Applies submission-write transitions to the base aggregate layer.
pub struct ResponseAggregator {
    store: Arc<dyn AggregateStore>,
    ladder: ResolutionLadder,
}

impl ResponseAggregator {
    pub fn new(store: Arc<dyn AggregateStore>, ladder: ResolutionLadder) -> Self {
        Self { store, ladder }
    }

    /// React to one submission write. `None` before means the document was
    /// created; `None` after means it was deleted.
    ///
    /// A counted submission without a resolvable location is skipped with a
    /// warning; the document write itself has already succeeded. A move
    /// between cells is two applies and is not atomic across them; the
    /// rollup reconciles any window in between.
    pub fn on_response_written(
        &self,
        before: Option<&Submission>,
        after: Option<&Submission>,
    ) -> Result<()> {
        let base = self.ladder.base();
        let old = before.and_then(|s| self.counted_cell(s, base).map(|c| (s, c)));
        let new = after.and_then(|s| self.counted_cell(s, base).map(|c| (s, c)));

        match (old, new) {
            (None, None) => Ok(()),
            // Newly counted
            (None, Some((sub, cell))) => {
                let delta = CellDelta {
                    stats: counters_by_question(&sub.answers),
                    respondents: 1,
                };
                self.apply(&sub.poll_id, cell, delta)
            }
            // Newly uncounted
            (Some((sub, cell)), None) => {
                let delta = CellDelta {
                    stats: negated(counters_by_question(&sub.answers)),
                    respondents: -1,
                };
                self.apply(&sub.poll_id, cell, delta)
            }
            // Same-cell edit
            (Some((old_sub, old_cell)), Some((new_sub, new_cell))) if old_cell == new_cell => {
                let delta = CellDelta {
                    stats: edit_delta(&old_sub.answers, &new_sub.answers),
                    respondents: 0,
                };
                self.apply(&new_sub.poll_id, new_cell, delta)
            }
            // Move between cells
            (Some((old_sub, old_cell)), Some((new_sub, new_cell))) => {
                self.apply(
                    &old_sub.poll_id,
                    old_cell,
                    CellDelta {
                        stats: negated(counters_by_question(&old_sub.answers)),
                        respondents: -1,
                    },
                )?;
                self.apply(
                    &new_sub.poll_id,
                    new_cell,
                    CellDelta {
                        stats: counters_by_question(&new_sub.answers),
                        respondents: 1,
                    },
                )
            }
        }
    }

    /// Base cell of a submission that should be counted, or `None`.
    fn counted_cell(&self, sub: &Submission, base: u8) -> Option<CellId> {
        if !sub.submitted {
            return None;
        }
        let cell = resolve_base_cell(sub, base);
        if cell.is_none() {
            warn!(
                poll = %sub.poll_id,
                user = %sub.user_id,
                "submission has no resolvable location, skipping aggregation"
            );
        }
        cell
    }

    fn apply(&self, poll: &str, cell: CellId, delta: CellDelta) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }
        debug!(poll, cell = %cell, respondents = delta.respondents, "applying delta");
        self.store.apply_delta(poll, cell, &delta)?;
        self.store.mark_dirty(poll)?;
        Ok(())
    }
}

fn negated(stats: BTreeMap<String, Counters>) -> BTreeMap<String, Counters> {
    stats.into_iter().map(|(q, c)| (q, c.negated())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsemap_store::GeoPoint;

    fn sub_at(lat: f64, lng: f64) -> Submission {
        Submission {
            poll_id: "p1".into(),
            user_id: "u1".into(),
            submitted: true,
            answers: [("q1".to_string(), 5.0)].into(),
            location: Some(GeoPoint { lat, lng }),
            cell: None,
            updated_at_ms: 1,
        }
    }

    #[test]
    fn stamp_finer_than_base_is_coarsened() {
        let mut sub = sub_at(39.95, -75.16);
        sub.cell = Some(CellId::at(48.85, 2.35, 12).unwrap());

        // The res-12 stamp wins over the coordinates
        let cell = resolve_base_cell(&sub, 8).unwrap();
        assert_eq!(cell, CellId::at(48.85, 2.35, 8).unwrap());
    }

    #[test]
    fn stamp_coarser_than_base_falls_back_to_coordinates() {
        let mut sub = sub_at(39.95, -75.16);
        sub.cell = Some(CellId::at(48.85, 2.35, 4).unwrap());

        let cell = resolve_base_cell(&sub, 8).unwrap();
        assert_eq!(cell, CellId::at(39.95, -75.16, 8).unwrap());
    }

    #[test]
    fn no_stamp_no_location_does_not_resolve() {
        let mut sub = sub_at(0.0, 0.0);
        sub.location = None;
        assert!(resolve_base_cell(&sub, 8).is_none());
    }
}
