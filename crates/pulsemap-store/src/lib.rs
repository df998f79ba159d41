//! Pulsemap Aggregate Store
//!
//! Key-value persistence for the aggregation engine: raw submissions,
//! per-cell counter aggregates, and per-poll rollup bookkeeping.
//!
//! # Design
//!
//! Aggregate counters are stored one numeric field per key, so concurrent
//! writers update a cell with *increments only* — there is no
//! read-modify-write anywhere on the hot path. Increments are commutative
//! and associative, so any interleaving of concurrent deltas converges to
//! the same state.
//!
//! Two backends implement the [`AggregateStore`] trait:
//!
//! - [`MemoryStore`] — a map behind a lock; applies a whole delta under one
//!   write guard. Used in tests and embedded setups.
//! - [`RocksStore`] — RocksDB with an associative add merge operator over
//!   little-endian `f64` values; a delta is one atomic `WriteBatch` of
//!   merges.
//!
//! # Key layout
//!
//! ```text
//! sub:{poll}:{user}                          submission doc (JSON)
//! agg:{poll}:{cell}:q:{question}:{field}     counter field (f64 LE)
//! agg:{poll}:{cell}:totalRespondents         respondent count (f64 LE)
//! agg:{poll}:{cell}:updatedAt                last update, ms (f64 LE)
//! roll:{poll}:dirty                          dirty flag (presence)
//! roll:{poll}:subat                          last submission, ms (f64 LE)
//! roll:{poll}:rolledat                       last rollup, ms (f64 LE)
//! ```
//!
//! Cell ids render as `res-x-y` and contain no `:`, so a layer is the key
//! range under `agg:{poll}:{res}-`. Poll, user, and question ids must not
//! contain `:`; write paths reject offenders.

mod error;
mod keys;
mod memory;
mod models;
mod rocks;
mod store;

pub use error::{Error, Result};
pub use keys::is_valid_id;
pub use memory::MemoryStore;
pub use models::{now_ms, AggregateCell, CellDelta, GeoPoint, PollRollupState, Submission};
pub use rocks::RocksStore;
pub use store::{AggregateStore, MAX_READ_BATCH};
