//! Pulsemap Aggregation Engine
//!
//! The write and read paths over the aggregate store:
//!
//! - [`ResponseAggregator`] — turns each submission write (create, edit,
//!   withdraw, move) into counter increments on the base-resolution cell.
//! - [`RollupEngine`] — rebuilds every configured resolution layer of a
//!   poll from its raw submissions; the authoritative reconciliation path.
//! - [`RangeQueryService`] — bounded viewport reads of per-question sums.
//! - [`RollupScheduler`] — periodic rollup of polls flagged dirty.
//!
//! The incremental path keeps only the base layer current; coarser layers
//! lag until the next rollup.

mod aggregator;
mod error;
mod ladder;
mod query;
mod rollup;
mod scheduler;

pub use aggregator::{resolve_base_cell, ResponseAggregator};
pub use error::{Error, Result};
pub use ladder::ResolutionLadder;
pub use query::{CellSum, RangeQueryService, MAX_COVERING_CELLS};
pub use rollup::{RollupEngine, RollupSummary};
pub use scheduler::RollupScheduler;
