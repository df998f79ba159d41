//! The aggregate store trait.

use crate::error::Result;
use crate::models::{AggregateCell, CellDelta, PollRollupState, Submission};
use pulsemap_grid::CellId;

/// Maximum number of cell ids one [`AggregateStore::read_cells`] call
/// accepts. Callers with larger coverings chunk and fan the results back in.
pub const MAX_READ_BATCH: usize = 64;

/// Persistence required by the aggregation engine.
///
/// Counter mutation is increment-only: [`apply_delta`] adds the delta's
/// fields to whatever is stored, atomically with respect to other deltas on
/// the same cell. Concurrent deltas therefore commute and no
/// read-modify-write cycle exists on the write path.
///
/// [`apply_delta`]: AggregateStore::apply_delta
pub trait AggregateStore: Send + Sync {
    // --- Submissions (raw responses) ---

    /// Store one respondent's submission document.
    fn put_submission(&self, sub: &Submission) -> Result<()>;

    /// Fetch one submission, if present.
    fn get_submission(&self, poll: &str, user: &str) -> Result<Option<Submission>>;

    /// Remove a submission, returning the prior document.
    fn delete_submission(&self, poll: &str, user: &str) -> Result<Option<Submission>>;

    /// All submissions for a poll (the rollup scan).
    fn list_submissions(&self, poll: &str) -> Result<Vec<Submission>>;

    // --- Aggregates ---

    /// Atomically add a delta's counter fields to one cell.
    fn apply_delta(&self, poll: &str, cell: CellId, delta: &CellDelta) -> Result<()>;

    /// Batched read of specific cells at one resolution. Cells with no
    /// record are omitted (zero contributions, not an error). At most
    /// [`MAX_READ_BATCH`] ids per call.
    fn read_cells(&self, poll: &str, res: u8, cells: &[CellId])
        -> Result<Vec<(CellId, AggregateCell)>>;

    /// Every cell of one (poll, resolution) layer. Unbounded; reserved for
    /// small polls, rebuild verification, and admin paths.
    fn list_layer(&self, poll: &str, res: u8) -> Result<Vec<(CellId, AggregateCell)>>;

    /// Replace one (poll, resolution) layer wholesale: delete everything
    /// under it, then write the fresh set. Stale cells disappear.
    fn replace_layer(&self, poll: &str, res: u8, cells: &[(CellId, AggregateCell)]) -> Result<()>;

    // --- Rollup bookkeeping ---

    /// Flag a poll as having writes since its last rollup. Idempotent.
    fn mark_dirty(&self, poll: &str) -> Result<()>;

    /// Clear the dirty flag and stamp the rollup time.
    fn clear_dirty(&self, poll: &str) -> Result<()>;

    /// Current rollup bookkeeping for a poll.
    fn rollup_state(&self, poll: &str) -> Result<PollRollupState>;

    /// Polls currently flagged dirty.
    fn list_dirty_polls(&self) -> Result<Vec<String>>;
}
