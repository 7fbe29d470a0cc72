//! Tile backends.
//!
//! The protocol services only decide *which* tile a request addresses; the
//! bytes come from a [`TileSource`]. This abstraction keeps the HTTP layer
//! independent of where tiles are stored.
//!
//! - [`DirectoryTileSource`]: pre-rendered tiles on the local filesystem
//! - [`EmptyTileSource`]: no tiles at all, used when only capabilities are served

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::TileSourceError;
use crate::model::Tile;

mod disk;

pub use disk::DirectoryTileSource;

// =============================================================================
// TileSource Trait
// =============================================================================

/// Trait for fetching the encoded image of a tile.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Fetch the encoded image for `tile`, in the tileset's image format.
    async fn get_tile(&self, tile: &Tile) -> Result<Bytes, TileSourceError>;
}

/// Source holding no tiles; every lookup fails with `NotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyTileSource;

#[async_trait]
impl TileSource for EmptyTileSource {
    async fn get_tile(&self, tile: &Tile) -> Result<Bytes, TileSourceError> {
        Err(TileSourceError::NotFound(format!(
            "{}@{}/{}/{}/{}",
            tile.tileset().name(),
            tile.grid_link().grid().name(),
            tile.z(),
            tile.x(),
            tile.y()
        )))
    }
}
