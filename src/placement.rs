//! # Placement
//!
//! Picks a spot on the plate for a new mesh that doesn't overlap the meshes
//! already there. The plate is split into square cells around the origin and
//! visited ring by ring, walking each ring east edge, north edge, west edge,
//! south edge.

use crate::geo::BoundingBox;
use log::{debug, warn};
use ultraviolet::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementConfig {
    /// edge length of a grid cell in mm
    pub cell_size: f32,
    /// number of rings searched around the center cell
    pub rings: i32,
    /// gap kept between a placed mesh and the plate
    pub clearance: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig {
            cell_size: 30.,
            rings: 3,
            clearance: 0.01,
        }
    }
}

/// Cell coordinates in spiral order, center first
///
/// # Examples
///
/// ```
/// use printer_plate::placement::spiral_cells;
/// let cells = spiral_cells(1);
/// assert_eq!(cells.len(), 9);
/// assert_eq!(cells[0], (0, 0));
/// assert_eq!(cells[1], (1, 0));
/// assert_eq!(cells[2], (1, 1));
/// assert_eq!(cells[3], (0, 1));
/// ```
pub fn spiral_cells(rings: i32) -> Vec<(i32, i32)> {
    let rings = rings.max(0);
    let side = (2 * rings + 1) as usize;
    let mut cells = Vec::with_capacity(side * side);
    cells.push((0, 0));
    for r in 1..=rings {
        // east edge, heading north
        for y in (-r + 1)..=r {
            cells.push((r, y));
        }
        // north edge, heading west
        for x in ((-r)..r).rev() {
            cells.push((x, r));
        }
        // west edge, heading south
        for y in ((-r)..r).rev() {
            cells.push((-r, y));
        }
        // south edge, heading east
        for x in (-r + 1)..=r {
            cells.push((x, -r));
        }
    }
    cells
}

/// Offset that centers `bounds` on `cell` with its floor at the clearance
pub fn cell_offset(bounds: &BoundingBox, cell: (i32, i32), config: &PlacementConfig) -> Vec3 {
    let center = bounds.center();
    Vec3::new(
        cell.0 as f32 * config.cell_size - center.x,
        cell.1 as f32 * config.cell_size - center.y,
        config.clearance - bounds.min.pos.z,
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// chosen cell, `None` when every cell was taken
    pub cell: Option<(i32, i32)>,
    /// translation to add to the mesh position
    pub offset: Vec3,
}

/// First cell in spiral order where `bounds` overlaps nothing in `placed`,
/// falls back to the origin when the grid is full
pub fn find_free_cell(bounds: &BoundingBox, placed: &[BoundingBox], config: &PlacementConfig) -> Placement {
    for cell in spiral_cells(config.rings) {
        let offset = cell_offset(bounds, cell, config);
        let candidate = bounds.translated(offset);
        if !placed.iter().any(|other| candidate.intersects(other)) {
            debug!("placing at cell {:?}", cell);
            return Placement {
                cell: Some(cell),
                offset,
            };
        }
    }
    warn!("no free cell on the plate, placing at the origin");
    Placement {
        cell: None,
        offset: cell_offset(bounds, (0, 0), config),
    }
}
