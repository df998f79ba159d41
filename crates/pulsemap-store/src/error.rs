//! Error types for the aggregate store.

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage backend error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An identifier that cannot be used in a storage key.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// A malformed key or value encountered during a scan.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// More cell ids than one batched read allows; callers chunk.
    #[error("batch of {got} cell ids exceeds maximum {max}")]
    BatchTooLarge { got: usize, max: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}
