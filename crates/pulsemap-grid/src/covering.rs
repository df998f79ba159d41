//! Covering a bounding rectangle with grid cells.

use crate::bbox::BoundingBox;
use crate::cell::CellId;
use crate::error::Result;

/// Index ranges of the cells intersecting a bounding box at a resolution.
fn index_ranges(bbox: &BoundingBox, res: u8) -> Result<(u32, u32, u32, u32)> {
    bbox.validate()?;
    let sw = CellId::at(bbox.south, bbox.west, res)?;
    let ne = CellId::at(bbox.north, bbox.east, res)?;
    Ok((sw.x, ne.x, sw.y, ne.y))
}

/// Number of cells [`covering_cells`] would return, without allocating them.
///
/// Callers use this to reject excessive resolution/area combinations before
/// enumeration.
pub fn covering_size(bbox: &BoundingBox, res: u8) -> Result<u64> {
    let (x0, x1, y0, y1) = index_ranges(bbox, res)?;
    Ok((x1 - x0 + 1) as u64 * (y1 - y0 + 1) as u64)
}

/// Enumerate the cells whose footprint intersects the rectangle.
///
/// Never truncates: the full covering is returned regardless of size.
/// Callers enforce their own limits via [`covering_size`].
pub fn covering_cells(bbox: &BoundingBox, res: u8) -> Result<Vec<CellId>> {
    let (x0, x1, y0, y1) = index_ranges(bbox, res)?;
    let mut cells =
        Vec::with_capacity(((x1 - x0 + 1) as usize).saturating_mul((y1 - y0 + 1) as usize));
    for x in x0..=x1 {
        for y in y0..=y1 {
            cells.push(CellId { x, y, res });
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covering_contains_interior_points() {
        let bbox = BoundingBox::new(-75.0, 39.0, -74.0, 40.0).unwrap();
        let cells = covering_cells(&bbox, 8).unwrap();

        // Every point inside the box maps to a cell in the covering
        let inside = CellId::at(39.5, -74.5, 8).unwrap();
        assert!(cells.contains(&inside));

        // A point well outside does not
        let outside = CellId::at(34.0, -118.0, 8).unwrap();
        assert!(!cells.contains(&outside));
    }

    #[test]
    fn covering_size_matches_enumeration() {
        let bbox = BoundingBox::new(-75.0, 39.0, -74.0, 40.0).unwrap();
        for res in [0u8, 4, 8, 10] {
            let size = covering_size(&bbox, res).unwrap();
            let cells = covering_cells(&bbox, res).unwrap();
            assert_eq!(size as usize, cells.len());
        }
    }

    #[test]
    fn tiny_box_covers_one_cell_at_coarse_res() {
        let bbox = BoundingBox::new(-75.0, 39.0, -74.99, 39.01).unwrap();
        let cells = covering_cells(&bbox, 4).unwrap();
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn covering_grows_with_resolution() {
        let bbox = BoundingBox::new(-80.0, 35.0, -70.0, 45.0).unwrap();
        let mut last = 0;
        for res in 4..=10 {
            let size = covering_size(&bbox, res).unwrap();
            assert!(size >= last);
            last = size;
        }
    }

    #[test]
    fn invalid_bounds_rejected() {
        let bbox = BoundingBox {
            west: 10.0,
            south: 0.0,
            east: -10.0,
            north: 5.0,
        };
        assert!(covering_cells(&bbox, 8).is_err());
        assert!(covering_size(&bbox, 8).is_err());
    }
}
