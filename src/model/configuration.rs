//! Immutable tileset/grid configuration and its YAML loader.
//!
//! # File Format
//!
//! ```yaml
//! metadata:
//!   url: https://tiles.example.com   # online resource used in generated links
//!   title: Example tiles
//!
//! grids:
//!   utm33:
//!     srs: EPSG:32633
//!     units: m
//!     extent: [166021.44, 0.0, 833978.56, 9329005.18]
//!     tile_size: [256, 256]
//!     resolutions: [4096, 2048, 1024, 512]
//!
//! formats:
//!   PNG8:
//!     extension: png
//!     mime_type: image/png
//!
//! tilesets:
//!   basetiles:
//!     grids:
//!       - WGS84
//!       - grid: GoogleMapsCompatible
//!         extent: [-2000000, -2000000, 2000000, 2000000]
//!     format: JPEG
//!     metadata:
//!       title: Base tiles
//! ```
//!
//! The `WGS84` and `GoogleMapsCompatible` grids and the `PNG` and `JPEG`
//! formats are always available; entries with the same name replace them.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

use super::grid::{BoundingBox, Grid, GridLink, GridUnits};
use super::tileset::{ImageFormat, Tileset};

// =============================================================================
// File Schema
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    metadata: HashMap<String, String>,

    #[serde(default)]
    grids: BTreeMap<String, GridDef>,

    #[serde(default)]
    formats: BTreeMap<String, FormatDef>,

    #[serde(default)]
    tilesets: BTreeMap<String, TilesetDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GridDef {
    srs: String,
    #[serde(default = "default_units")]
    units: String,
    extent: [f64; 4],
    #[serde(default = "default_tile_size")]
    tile_size: [u32; 2],
    resolutions: Vec<f64>,
}

fn default_units() -> String {
    "m".to_string()
}

fn default_tile_size() -> [u32; 2] {
    [256, 256]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormatDef {
    extension: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TilesetDef {
    grids: Vec<GridRef>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// A grid reference: either a bare grid name or a name plus restricted extent.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GridRef {
    Name(String),
    Restricted { grid: String, extent: [f64; 4] },
}

// =============================================================================
// Configuration
// =============================================================================

/// Tilesets, grids and service metadata, shared read-only by all requests.
#[derive(Debug, Clone)]
pub struct Configuration {
    metadata: HashMap<String, String>,
    grids: HashMap<String, Arc<Grid>>,
    formats: HashMap<String, ImageFormat>,
    tilesets: BTreeMap<String, Arc<Tileset>>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    /// Configuration holding only the built-in grids and formats.
    pub fn new() -> Self {
        let grids = [Grid::wgs84(), Grid::google_maps_compatible()]
            .into_iter()
            .map(|g| (g.name().to_string(), Arc::new(g)))
            .collect();
        let formats = [ImageFormat::png(), ImageFormat::jpeg()]
            .into_iter()
            .map(|f| (f.name.clone(), f))
            .collect();

        Self {
            metadata: HashMap::new(),
            grids,
            formats,
            tilesets: BTreeMap::new(),
        }
    }

    /// Load a configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        let mut config = Self::new();

        for (key, value) in file.metadata {
            config = config.with_metadata(key, value)?;
        }

        for (name, def) in file.grids {
            let units = GridUnits::parse(&def.units).ok_or_else(|| ConfigError::InvalidGrid {
                grid: name.clone(),
                message: format!("unknown units {}", def.units),
            })?;
            let grid = Grid::new(
                name,
                def.srs,
                units,
                BoundingBox::from(def.extent),
                (def.tile_size[0], def.tile_size[1]),
                def.resolutions,
            )?;
            config = config.with_grid(grid)?;
        }

        for (name, def) in file.formats {
            config
                .formats
                .insert(name.clone(), ImageFormat::new(name, def.extension, def.mime_type));
        }

        for (name, def) in file.tilesets {
            let tileset = config.build_tileset(name, def)?;
            config = config.with_tileset(tileset)?;
        }

        Ok(config)
    }

    fn build_tileset(&self, name: String, def: TilesetDef) -> Result<Tileset, ConfigError> {
        let mut links = Vec::with_capacity(def.grids.len());
        for grid_ref in def.grids {
            let (grid_name, extent) = match grid_ref {
                GridRef::Name(grid) => (grid, None),
                GridRef::Restricted { grid, extent } => (grid, Some(BoundingBox::from(extent))),
            };
            let grid = self
                .grids
                .get(&grid_name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownGrid {
                    tileset: name.clone(),
                    grid: grid_name.clone(),
                })?;
            links.push(match extent {
                Some(extent) => GridLink::with_restricted_extent(grid, extent)?,
                None => GridLink::new(grid),
            });
        }

        let format = match def.format {
            Some(format) => Some(self.formats.get(&format).cloned().ok_or_else(|| {
                ConfigError::UnknownFormat {
                    tileset: name.clone(),
                    format,
                }
            })?),
            None => None,
        };

        let mut tileset = Tileset::new(name, links)?;
        if let Some(format) = format {
            tileset = tileset.with_format(format);
        }
        for (key, value) in def.metadata {
            tileset = tileset.with_metadata(key, value);
        }
        Ok(tileset)
    }

    /// Set a service metadata entry. `url` must be an absolute URL.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let (key, value) = (key.into(), value.into());
        if key == "url" {
            validate_url(&value)?;
        }
        self.metadata.insert(key, value);
        Ok(self)
    }

    /// Add or replace a grid.
    pub fn with_grid(mut self, grid: Grid) -> Result<Self, ConfigError> {
        validate_name(grid.name())?;
        debug!(grid = grid.name(), levels = grid.nlevels(), "Registered grid");
        self.grids.insert(grid.name().to_string(), Arc::new(grid));
        Ok(self)
    }

    /// Add or replace a tileset.
    pub fn with_tileset(mut self, tileset: Tileset) -> Result<Self, ConfigError> {
        validate_name(tileset.name())?;
        if let Some(url) = tileset.metadata("url") {
            validate_url(url)?;
        }
        debug!(
            tileset = tileset.name(),
            grids = tileset.grid_links().len(),
            "Registered tileset"
        );
        self.tilesets
            .insert(tileset.name().to_string(), Arc::new(tileset));
        Ok(self)
    }

    /// Look up a tileset by exact name.
    pub fn get_tileset(&self, name: &str) -> Option<&Arc<Tileset>> {
        self.tilesets.get(name)
    }

    /// All tilesets, ordered by name.
    pub fn tilesets(&self) -> impl Iterator<Item = &Arc<Tileset>> {
        self.tilesets.values()
    }

    pub fn grid(&self, name: &str) -> Option<&Arc<Grid>> {
        self.grids.get(name)
    }

    /// All grids, ordered by name.
    pub fn grids(&self) -> Vec<&Arc<Grid>> {
        let mut grids: Vec<_> = self.grids.values().collect();
        grids.sort_by(|a, b| a.name().cmp(b.name()));
        grids
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Base URL configured for generated links, if any.
    pub fn online_resource(&self) -> Option<&str> {
        self.metadata("url")
    }
}

fn validate_url(value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            url: value.to_string(),
            message: e.to_string(),
        })
}

/// Names appear verbatim as path segments and in XML documents.
fn validate_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |message: &str| ConfigError::InvalidName {
        name: name.to_string(),
        message: message.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("name must not be a relative path component"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'))
    {
        return Err(invalid(
            "only ASCII letters, digits, '_', '-', '.' and ':' are allowed",
        ));
    }
    Ok(())
}
