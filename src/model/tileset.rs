//! Tilesets and their output image formats.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ConfigError;

use super::grid::GridLink;

/// Extension used in tile URLs when a tileset has no configured format.
pub const DEFAULT_EXTENSION: &str = "png";

/// MIME type served when a tileset has no configured format.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

// =============================================================================
// Image Format
// =============================================================================

/// Encoded image format a tileset is served in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFormat {
    pub name: String,
    pub extension: String,
    pub mime_type: String,
}

impl ImageFormat {
    pub fn new(
        name: impl Into<String>,
        extension: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn png() -> Self {
        Self::new("PNG", "png", "image/png")
    }

    pub fn jpeg() -> Self {
        Self::new("JPEG", "jpg", "image/jpeg")
    }
}

// =============================================================================
// Tileset
// =============================================================================

/// A named map layer with the grids it can be served under.
///
/// The first grid link is the default one, used when a request names the
/// tileset without an `@grid` suffix.
#[derive(Debug, Clone)]
pub struct Tileset {
    name: String,
    grid_links: Vec<Arc<GridLink>>,
    format: Option<ImageFormat>,
    metadata: HashMap<String, String>,
}

impl Tileset {
    /// Create a tileset. At least one grid link is required.
    pub fn new(name: impl Into<String>, grid_links: Vec<GridLink>) -> Result<Self, ConfigError> {
        let name = name.into();
        if grid_links.is_empty() {
            return Err(ConfigError::NoGrids { tileset: name });
        }
        Ok(Self {
            name,
            grid_links: grid_links.into_iter().map(Arc::new).collect(),
            format: None,
            metadata: HashMap::new(),
        })
    }

    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid_links(&self) -> &[Arc<GridLink>] {
        &self.grid_links
    }

    /// Grid link used when no grid is named in the request.
    pub fn default_grid_link(&self) -> &Arc<GridLink> {
        &self.grid_links[0]
    }

    /// Grid link whose grid is named exactly `grid_name`.
    pub fn grid_link(&self, grid_name: &str) -> Option<&Arc<GridLink>> {
        self.grid_links
            .iter()
            .find(|link| link.grid().name() == grid_name)
    }

    pub fn format(&self) -> Option<&ImageFormat> {
        self.format.as_ref()
    }

    /// File extension of served tiles.
    pub fn extension(&self) -> &str {
        self.format
            .as_ref()
            .map_or(DEFAULT_EXTENSION, |f| f.extension.as_str())
    }

    /// MIME type of served tiles.
    pub fn mime_type(&self) -> &str {
        self.format
            .as_ref()
            .map_or(DEFAULT_MIME_TYPE, |f| f.mime_type.as_str())
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Human-readable title, falling back to the tileset name.
    pub fn title(&self) -> &str {
        self.metadata("title").unwrap_or(&self.name)
    }
}
