//! Range queries over aggregate layers.

use crate::error::{Error, Result};
use crate::ladder::ResolutionLadder;
use pulsemap_grid::{covering_cells, covering_size, BoundingBox, CellId};
use pulsemap_store::{is_valid_id, AggregateCell, AggregateStore, MAX_READ_BATCH};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Largest covering a bounded query may enumerate. Beyond this the request
/// is rejected outright rather than partially answered.
pub const MAX_COVERING_CELLS: u64 = 4096;

/// One cell's answer sum for the queried question.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSum {
    pub cell_id: CellId,
    pub sum: f64,
}

/// Reads per-question sums for a map viewport.
pub struct RangeQueryService {
    store: Arc<dyn AggregateStore>,
    ladder: ResolutionLadder,
}

impl RangeQueryService {
    pub fn new(store: Arc<dyn AggregateStore>, ladder: ResolutionLadder) -> Self {
        Self { store, ladder }
    }

    /// Sum of one question per cell at a ladder resolution, optionally
    /// restricted to a bounding box.
    ///
    /// Cells without a stored record, and cells whose record lacks the
    /// question, contribute nothing; neither is an error.
    pub fn query(
        &self,
        poll: &str,
        question: &str,
        res: u8,
        bounds: Option<&BoundingBox>,
    ) -> Result<Vec<CellSum>> {
        if !is_valid_id(poll) {
            return Err(Error::InvalidArgument(format!("poll id {poll:?}")));
        }
        if !is_valid_id(question) {
            return Err(Error::InvalidArgument(format!("question id {question:?}")));
        }
        if !self.ladder.contains(res) {
            return Err(Error::InvalidArgument(format!(
                "resolution {res} is not an aggregated level"
            )));
        }

        let cells = match bounds {
            None => self.store.list_layer(poll, res)?,
            Some(bbox) => {
                let size = covering_size(bbox, res)
                    .map_err(|e| Error::InvalidArgument(e.to_string()))?;
                if size > MAX_COVERING_CELLS {
                    return Err(Error::InvalidArgument(format!(
                        "bounding box covers {size} cells at resolution {res}, maximum is {MAX_COVERING_CELLS}"
                    )));
                }
                let covering = covering_cells(bbox, res)
                    .map_err(|e| Error::InvalidArgument(e.to_string()))?;
                debug!(poll, res, cells = covering.len(), "bounded aggregate read");

                let mut found: Vec<(CellId, AggregateCell)> = Vec::new();
                for chunk in covering.chunks(MAX_READ_BATCH) {
                    found.extend(self.store.read_cells(poll, res, chunk)?);
                }
                found
            }
        };

        Ok(cells
            .into_iter()
            .filter_map(|(cell, agg)| {
                agg.stats.get(question).map(|c| CellSum {
                    cell_id: cell,
                    sum: c.sum,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsemap_store::MemoryStore;

    fn service() -> RangeQueryService {
        RangeQueryService::new(
            Arc::new(MemoryStore::new()),
            ResolutionLadder::new(vec![4, 8]).unwrap(),
        )
    }

    #[test]
    fn rejects_non_ladder_resolution() {
        let svc = service();
        assert!(matches!(
            svc.query("p1", "q1", 6, None),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_oversized_covering() {
        let svc = RangeQueryService::new(
            Arc::new(MemoryStore::new()),
            ResolutionLadder::new(vec![15]).unwrap(),
        );
        let world = BoundingBox::new(-179.0, -89.0, 179.0, 89.0).unwrap();
        assert!(matches!(
            svc.query("p1", "q1", 15, Some(&world)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_bad_ids() {
        let svc = service();
        assert!(svc.query("a:b", "q1", 8, None).is_err());
        assert!(svc.query("p1", "", 8, None).is_err());
    }

    #[test]
    fn empty_layer_is_empty_result() {
        let svc = service();
        assert!(svc.query("p1", "q1", 8, None).unwrap().is_empty());
    }

    #[test]
    fn cell_sum_serializes_with_cell_string() {
        let sum = CellSum {
            cell_id: CellId::at(39.95, -75.16, 8).unwrap(),
            sum: 3.0,
        };
        let json = serde_json::to_value(&sum).unwrap();
        assert_eq!(json["cellId"], "8-149-184");
        assert_eq!(json["sum"], 3.0);
    }
}
