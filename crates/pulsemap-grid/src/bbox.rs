//! Geographic bounding rectangles.

use crate::error::{GridError, Result};

/// A geographic bounding rectangle in degrees.
///
/// Edges follow map-viewport convention: `west < east` and `south < north`.
/// Rectangles crossing the antimeridian are not representable; clients split
/// such viewports into two queries.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a bounding box, validating edge ordering.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        let bbox = Self {
            west,
            south,
            east,
            north,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Check that all edges are finite and correctly ordered.
    pub fn validate(&self) -> Result<()> {
        let edges = [self.west, self.south, self.east, self.north];
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(GridError::InvalidBounds(format!(
                "non-finite edge in ({}, {}, {}, {})",
                self.west, self.south, self.east, self.north
            )));
        }
        if self.west >= self.east {
            return Err(GridError::InvalidBounds(format!(
                "west {} must be less than east {}",
                self.west, self.east
            )));
        }
        if self.south >= self.north {
            return Err(GridError::InvalidBounds(format!(
                "south {} must be less than north {}",
                self.south, self.north
            )));
        }
        Ok(())
    }
}
