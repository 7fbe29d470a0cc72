//! Tile coordinates bound to a tileset and grid link.

use std::sync::Arc;

use crate::error::ServiceError;

use super::grid::{BoundingBox, GridLink};
use super::tileset::Tileset;

/// One addressable tile of a tileset's pyramid under one grid link.
///
/// Tiles are only built through [`Tile::new_validated`] or [`Tile::child`], so
/// `z` is always a level of the grid.
#[derive(Debug, Clone)]
pub struct Tile {
    tileset: Arc<Tileset>,
    grid_link: Arc<GridLink>,
    z: u32,
    x: u64,
    y: u64,
}

impl Tile {
    /// Create a tile, rejecting coordinates outside the grid link's range.
    pub fn new_validated(
        tileset: Arc<Tileset>,
        grid_link: Arc<GridLink>,
        z: i64,
        x: i64,
        y: i64,
    ) -> Result<Self, ServiceError> {
        if !grid_link.contains(z, x, y) {
            return Err(ServiceError::TileOutOfBounds {
                tileset: tileset.name().to_string(),
                grid: grid_link.grid().name().to_string(),
                z,
                x,
                y,
            });
        }

        // contains() guarantees all three are non-negative and z is a grid level
        Ok(Self {
            tileset,
            grid_link,
            z: z as u32,
            x: x as u64,
            y: y as u64,
        })
    }

    /// Child quadrant `(2x + i, 2y + j)` one level deeper, or `None` at the
    /// deepest level.
    pub fn child(&self, i: u64, j: u64) -> Option<Tile> {
        let z = self.z + 1;
        if z as usize >= self.grid_link.grid().nlevels() {
            return None;
        }
        Some(Tile {
            tileset: Arc::clone(&self.tileset),
            grid_link: Arc::clone(&self.grid_link),
            z,
            x: self.x.checked_mul(2)?.checked_add(i)?,
            y: self.y.checked_mul(2)?.checked_add(j)?,
        })
    }

    pub fn tileset(&self) -> &Arc<Tileset> {
        &self.tileset
    }

    pub fn grid_link(&self) -> &Arc<GridLink> {
        &self.grid_link
    }

    pub fn z(&self) -> u32 {
        self.z
    }

    pub fn x(&self) -> u64 {
        self.x
    }

    pub fn y(&self) -> u64 {
        self.y
    }

    /// Whether this tile sits on the grid's deepest level.
    pub fn is_deepest_level(&self) -> bool {
        self.z as usize + 1 >= self.grid_link.grid().nlevels()
    }

    pub fn bbox(&self) -> BoundingBox {
        self.grid_link.grid().tile_bbox(self.z, self.x, self.y)
    }
}
