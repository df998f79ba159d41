//! Engine error types.

use thiserror::Error;

/// Errors surfaced by the aggregation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The request is malformed; nothing was read or written.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A rollup for this poll is already running.
    #[error("rollup already in progress for poll {0}")]
    RollupInProgress(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Store(#[from] pulsemap_store::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
