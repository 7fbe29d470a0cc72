//! Filesystem-backed tile source.
//!
//! Tiles are looked up at `<root>/<tileset>/<grid>/<z>/<x>/<y>.<ext>`, the
//! layout produced by seeding a tile cache to disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::TileSourceError;
use crate::model::Tile;

use super::TileSource;

/// Reads pre-rendered tiles from a directory tree.
///
/// # Example
///
/// ```ignore
/// use tile_services::source::{DirectoryTileSource, TileSource};
///
/// let source = DirectoryTileSource::new("/var/cache/tiles");
/// let bytes = source.get_tile(&tile).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryTileSource {
    root: PathBuf,
}

impl DirectoryTileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of `tile` below the root directory.
    pub fn tile_path(&self, tile: &Tile) -> PathBuf {
        self.root
            .join(tile.tileset().name())
            .join(tile.grid_link().grid().name())
            .join(tile.z().to_string())
            .join(tile.x().to_string())
            .join(format!("{}.{}", tile.y(), tile.tileset().extension()))
    }
}

#[async_trait]
impl TileSource for DirectoryTileSource {
    async fn get_tile(&self, tile: &Tile) -> Result<Bytes, TileSourceError> {
        let path = self.tile_path(tile);
        debug!(path = %path.display(), "Reading tile");

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(TileSourceError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(TileSourceError::Io(format!("{}: {}", path.display(), e))),
        }
    }
}
