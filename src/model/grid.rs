//! Grids and grid links.
//!
//! A [`Grid`] is a tiling scheme over a coordinate reference system: an extent,
//! a tile size in pixels and one resolution per zoom level. Tile rows are
//! counted from the bottom of the extent, so tile `(x, y)` at level `z` covers
//!
//! ```text
//! minx = extent.minx + x * tile_width  * resolution[z]
//! miny = extent.miny + y * tile_height * resolution[z]
//! ```
//!
//! A [`GridLink`] binds a grid to a tileset, optionally restricting the extent
//! the tileset covers. It precomputes the valid tile range for each level.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

/// Tolerance when snapping a restricted extent onto tile boundaries.
const LIMIT_EPSILON: f64 = 1e-6;

// =============================================================================
// Bounding Box
// =============================================================================

/// Axis-aligned box in grid units, stored as `[minx, miny, maxx, maxy]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl BoundingBox {
    pub fn new(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Self {
        Self {
            minx,
            miny,
            maxx,
            maxy,
        }
    }

    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn north(&self) -> f64 {
        self.maxy
    }

    pub fn south(&self) -> f64 {
        self.miny
    }

    pub fn east(&self) -> f64 {
        self.maxx
    }

    pub fn west(&self) -> f64 {
        self.minx
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.minx, self.miny, self.maxx, self.maxy]
    }

    /// Whether `other` lies entirely inside this box.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.minx >= self.minx
            && other.miny >= self.miny
            && other.maxx <= self.maxx
            && other.maxy <= self.maxy
    }

    fn is_valid(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite()) && self.width() > 0.0 && self.height() > 0.0
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.minx, self.miny, self.maxx, self.maxy
        )
    }
}

// =============================================================================
// Grid
// =============================================================================

/// Units the grid extent and resolutions are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridUnits {
    Meters,
    Degrees,
    Feet,
}

impl GridUnits {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "m" | "meters" => Some(GridUnits::Meters),
            "dd" | "degrees" => Some(GridUnits::Degrees),
            "ft" | "feet" => Some(GridUnits::Feet),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GridUnits::Meters => "m",
            GridUnits::Degrees => "dd",
            GridUnits::Feet => "ft",
        }
    }
}

/// A named tiling scheme with a leveled tile pyramid.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    name: String,
    srs: String,
    units: GridUnits,
    extent: BoundingBox,
    tile_width: u32,
    tile_height: u32,
    resolutions: Vec<f64>,
}

impl Grid {
    /// Create a grid, rejecting geometry that cannot be tiled.
    ///
    /// Resolutions are given from the coarsest (level 0) to the finest level.
    pub fn new(
        name: impl Into<String>,
        srs: impl Into<String>,
        units: GridUnits,
        extent: BoundingBox,
        tile_size: (u32, u32),
        resolutions: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let invalid = |message: &str| ConfigError::InvalidGrid {
            grid: name.clone(),
            message: message.to_string(),
        };

        if !extent.is_valid() {
            return Err(invalid("extent must be finite with positive width and height"));
        }
        if tile_size.0 == 0 || tile_size.1 == 0 {
            return Err(invalid("tile size must be non-zero"));
        }
        if resolutions.is_empty() {
            return Err(invalid("at least one resolution is required"));
        }
        if resolutions.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(invalid("resolutions must be positive"));
        }

        Ok(Self {
            name,
            srs: srs.into(),
            units,
            extent,
            tile_width: tile_size.0,
            tile_height: tile_size.1,
            resolutions,
        })
    }

    /// The `WGS84` grid: EPSG:4326, whole world, 18 levels, two tiles at level 0.
    pub fn wgs84() -> Self {
        Self {
            name: "WGS84".to_string(),
            srs: "EPSG:4326".to_string(),
            units: GridUnits::Degrees,
            extent: BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            tile_width: 256,
            tile_height: 256,
            resolutions: halving_resolutions(0.703125, 18),
        }
    }

    /// The `GoogleMapsCompatible` grid: EPSG:3857 web mercator, 19 levels.
    pub fn google_maps_compatible() -> Self {
        const ORIGIN_SHIFT: f64 = 20037508.3427892;
        Self {
            name: "GoogleMapsCompatible".to_string(),
            srs: "EPSG:3857".to_string(),
            units: GridUnits::Meters,
            extent: BoundingBox::new(-ORIGIN_SHIFT, -ORIGIN_SHIFT, ORIGIN_SHIFT, ORIGIN_SHIFT),
            tile_width: 256,
            tile_height: 256,
            resolutions: halving_resolutions(156543.0339280410, 19),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn srs(&self) -> &str {
        &self.srs
    }

    pub fn units(&self) -> GridUnits {
        self.units
    }

    pub fn extent(&self) -> &BoundingBox {
        &self.extent
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Total number of zoom levels.
    pub fn nlevels(&self) -> usize {
        self.resolutions.len()
    }

    pub fn resolutions(&self) -> &[f64] {
        &self.resolutions
    }

    pub fn resolution(&self, z: u32) -> Option<f64> {
        self.resolutions.get(z as usize).copied()
    }

    /// Ground size of one tile at level `z`, as `(width, height)`.
    fn tile_span(&self, resolution: f64) -> (f64, f64) {
        (
            self.tile_width as f64 * resolution,
            self.tile_height as f64 * resolution,
        )
    }

    /// Number of tile columns and rows covering the full extent at level `z`.
    ///
    /// A partial tile only counts when it covers more than 1% of a tile.
    pub fn level_size(&self, z: u32) -> Option<(i64, i64)> {
        let (unit_w, unit_h) = self.tile_span(self.resolution(z)?);
        let cols = ((self.extent.width() - 0.01 * unit_w) / unit_w).ceil() as i64;
        let rows = ((self.extent.height() - 0.01 * unit_h) / unit_h).ceil() as i64;
        Some((cols.max(1), rows.max(1)))
    }

    /// Bounding box of tile `(x, y)` at level `z`.
    ///
    /// `z` must be below [`Grid::nlevels`]; tiles built through
    /// [`Tile`](super::Tile) always satisfy this.
    pub fn tile_bbox(&self, z: u32, x: u64, y: u64) -> BoundingBox {
        let (unit_w, unit_h) = self.tile_span(self.resolutions[z as usize]);
        let minx = self.extent.minx + x as f64 * unit_w;
        let miny = self.extent.miny + y as f64 * unit_h;
        BoundingBox::new(minx, miny, minx + unit_w, miny + unit_h)
    }

    /// TMS profile name advertised for this grid.
    pub fn profile(&self) -> &'static str {
        match self.srs.as_str() {
            "EPSG:4326" => "global-geodetic",
            "EPSG:3857" | "EPSG:900913" => "global-mercator",
            _ => "none",
        }
    }
}

/// `count` resolutions starting at `first`, each half the previous one.
fn halving_resolutions(first: f64, count: usize) -> Vec<f64> {
    (0..count).map(|z| first / (1u64 << z) as f64).collect()
}

// =============================================================================
// Grid Link
// =============================================================================

/// Half-open tile index range `[minx, maxx) x [miny, maxy)` at one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLimits {
    pub minx: i64,
    pub miny: i64,
    pub maxx: i64,
    pub maxy: i64,
}

impl TileLimits {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.minx && x < self.maxx && y >= self.miny && y < self.maxy
    }
}

/// Association between a tileset and one of the grids it is served under.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLink {
    grid: Arc<Grid>,
    restricted_extent: Option<BoundingBox>,
    limits: Vec<TileLimits>,
}

impl GridLink {
    /// Link covering the whole grid extent.
    pub fn new(grid: Arc<Grid>) -> Self {
        let limits = (0..grid.nlevels() as u32)
            .filter_map(|z| grid.level_size(z))
            .map(|(cols, rows)| TileLimits {
                minx: 0,
                miny: 0,
                maxx: cols,
                maxy: rows,
            })
            .collect();
        Self {
            grid,
            restricted_extent: None,
            limits,
        }
    }

    /// Link restricted to the tiles intersecting `extent`.
    pub fn with_restricted_extent(
        grid: Arc<Grid>,
        extent: BoundingBox,
    ) -> Result<Self, ConfigError> {
        if !extent.is_valid() || !grid.extent().contains(&extent) {
            return Err(ConfigError::InvalidGrid {
                grid: grid.name().to_string(),
                message: format!("restricted extent {} is not inside {}", extent, grid.extent()),
            });
        }

        let origin = *grid.extent();
        let limits = grid
            .resolutions()
            .iter()
            .map(|&res| {
                let (unit_w, unit_h) = grid.tile_span(res);
                TileLimits {
                    minx: ((extent.minx - origin.minx) / unit_w + LIMIT_EPSILON).floor() as i64,
                    miny: ((extent.miny - origin.miny) / unit_h + LIMIT_EPSILON).floor() as i64,
                    maxx: ((extent.maxx - origin.minx) / unit_w - LIMIT_EPSILON).ceil() as i64,
                    maxy: ((extent.maxy - origin.miny) / unit_h - LIMIT_EPSILON).ceil() as i64,
                }
            })
            .collect();

        Ok(Self {
            grid,
            restricted_extent: Some(extent),
            limits,
        })
    }

    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    pub fn restricted_extent(&self) -> Option<&BoundingBox> {
        self.restricted_extent.as_ref()
    }

    /// Extent actually covered: the restricted one, or the whole grid.
    pub fn extent(&self) -> &BoundingBox {
        self.restricted_extent
            .as_ref()
            .unwrap_or_else(|| self.grid.extent())
    }

    pub fn limits(&self, z: u32) -> Option<&TileLimits> {
        self.limits.get(z as usize)
    }

    /// Whether `(z, x, y)` addresses a tile of this link.
    pub fn contains(&self, z: i64, x: i64, y: i64) -> bool {
        if z < 0 || z >= self.grid.nlevels() as i64 {
            return false;
        }
        self.limits(z as u32)
            .is_some_and(|limits| limits.contains(x, y))
    }
}
