//! Cell identifiers.
//!
//! A [`CellId`] names one cell of the hierarchical grid: a column `x`, a row
//! `y`, and the resolution the pair is expressed at. Ids render as
//! `"res-x-y"` (e.g. `"8-210-183"`) so they can double as storage keys and
//! wire values.

use crate::error::{GridError, Result};
use crate::{columns_at, rows_at, MAX_RESOLUTION};
use std::fmt;
use std::str::FromStr;

/// A cell of the hierarchical grid at a specific resolution.
///
/// `x` counts columns east from -180 longitude, `y` counts rows north from
/// -90 latitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct CellId {
    /// Column index, `0..columns_at(res)`.
    pub x: u32,
    /// Row index, `0..rows_at(res)`.
    pub y: u32,
    /// Resolution the indices are expressed at.
    pub res: u8,
}

impl CellId {
    /// Create a cell id from raw indices, validating ranges.
    pub fn new(x: u32, y: u32, res: u8) -> Result<Self> {
        if res > MAX_RESOLUTION {
            return Err(GridError::InvalidResolution(format!(
                "resolution {} exceeds maximum {}",
                res, MAX_RESOLUTION
            )));
        }
        if x >= columns_at(res) || y >= rows_at(res) {
            return Err(GridError::InvalidCellId(format!(
                "indices ({}, {}) out of range at resolution {}",
                x, y, res
            )));
        }
        Ok(Self { x, y, res })
    }

    /// Map a coordinate to its cell at the given resolution.
    ///
    /// Coordinates are clamped to the valid lat/lng ranges, so points on the
    /// antimeridian or at the poles land in the outermost cells rather than
    /// falling off the grid. Non-finite coordinates are rejected.
    pub fn at(lat: f64, lng: f64, res: u8) -> Result<Self> {
        if res > MAX_RESOLUTION {
            return Err(GridError::InvalidResolution(format!(
                "resolution {} exceeds maximum {}",
                res, MAX_RESOLUTION
            )));
        }
        if !lat.is_finite() || !lng.is_finite() {
            return Err(GridError::InvalidCoordinate { lat, lng });
        }

        let lat = lat.clamp(-90.0, 90.0);
        let lng = lng.clamp(-180.0, 180.0);

        let cols = columns_at(res);
        let rows = rows_at(res);

        // floor() then clamp keeps lng = 180 / lat = 90 inside the grid.
        let x = (((lng + 180.0) / 360.0) * cols as f64).floor() as u32;
        let y = (((lat + 90.0) / 180.0) * rows as f64).floor() as u32;

        Ok(Self {
            x: x.min(cols - 1),
            y: y.min(rows - 1),
            res,
        })
    }

    /// The unique ancestor of this cell at a coarser resolution.
    ///
    /// Fails with [`GridError::InvalidResolution`] if `target_res` is finer
    /// than this cell's own resolution.
    pub fn ancestor_at(&self, target_res: u8) -> Result<Self> {
        if target_res > self.res {
            return Err(GridError::InvalidResolution(format!(
                "target resolution {} is finer than cell resolution {}",
                target_res, self.res
            )));
        }
        let shift = self.res - target_res;
        Ok(Self {
            x: self.x >> shift,
            y: self.y >> shift,
            res: target_res,
        })
    }

    /// The direct parent cell, or `None` at resolution 0.
    pub fn parent(&self) -> Option<Self> {
        if self.res == 0 {
            None
        } else {
            Some(Self {
                x: self.x >> 1,
                y: self.y >> 1,
                res: self.res - 1,
            })
        }
    }

    /// South-west corner of this cell in degrees, as `(lat, lng)`.
    pub fn south_west(&self) -> (f64, f64) {
        let lng = -180.0 + self.x as f64 * 360.0 / columns_at(self.res) as f64;
        let lat = -90.0 + self.y as f64 * 180.0 / rows_at(self.res) as f64;
        (lat, lng)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.res, self.x, self.y)
    }
}

impl FromStr for CellId {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, '-');
        let parse = |part: Option<&str>| -> Result<u32> {
            part.and_then(|p| p.parse().ok())
                .ok_or_else(|| GridError::InvalidCellId(s.to_string()))
        };
        let res = parse(parts.next())?;
        let x = parse(parts.next())?;
        let y = parse(parts.next())?;
        if res > MAX_RESOLUTION as u32 {
            return Err(GridError::InvalidCellId(s.to_string()));
        }
        Self::new(x, y, res as u8)
    }
}

impl From<CellId> for String {
    fn from(cell: CellId) -> Self {
        cell.to_string()
    }
}

impl TryFrom<String> for CellId {
    type Error = GridError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}
