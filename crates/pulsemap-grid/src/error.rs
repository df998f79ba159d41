//! Error types for the spatial grid.

use thiserror::Error;

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that can occur in grid operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Resolution outside the supported range, or a target resolution finer
    /// than the cell it is derived from.
    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    /// Latitude or longitude is not a finite number.
    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Bounding box with inverted or non-finite edges.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// A cell id string that does not parse.
    #[error("invalid cell id: {0}")]
    InvalidCellId(String),
}
