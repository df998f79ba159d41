//! Pulsemap Spatial Grid
//!
//! Hierarchical lat/lng cell grid for multi-resolution spatial aggregation.
//!
//! # Cell Scheme
//!
//! The world is divided into equal-degree rectangular cells. At resolution
//! `r` (0..=15) the grid is `2^(r+1)` columns (x, east from -180) by `2^r`
//! rows (y, north from -90). Every cell splits into exactly four children at
//! resolution `r + 1`, so the ancestor of a cell at any coarser resolution
//! is a pair of right-shifts:
//!
//! ```text
//! res 0:   2 x 1 cells    (two 180x180 degree squares)
//! res 1:   4 x 2 cells
//! res 8:   512 x 256 cells   (~0.7 degrees per cell)
//! res 15:  65536 x 32768 cells
//! ```
//!
//! # Guarantees
//!
//! - Deterministic: the same coordinate always maps to the same cell id at
//!   a given resolution.
//! - Hierarchical: `CellId::at(lat, lng, coarse)` equals
//!   `CellId::at(lat, lng, fine).ancestor_at(coarse)` for any `coarse <= fine`.
//! - Pure: no I/O, no global state.

mod bbox;
mod cell;
mod covering;
mod error;

pub use bbox::BoundingBox;
pub use cell::CellId;
pub use covering::{covering_cells, covering_size};
pub use error::{GridError, Result};

/// Coarsest supported resolution.
pub const MIN_RESOLUTION: u8 = 0;

/// Finest supported resolution.
pub const MAX_RESOLUTION: u8 = 15;

/// Number of grid columns at a resolution (east-west).
pub const fn columns_at(res: u8) -> u32 {
    2u32 << res
}

/// Number of grid rows at a resolution (north-south).
pub const fn rows_at(res: u8) -> u32 {
    1u32 << res
}
