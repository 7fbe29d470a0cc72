//! Tileset and grid configuration model.
//!
//! This module holds the immutable objects every protocol service resolves
//! requests against:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Configuration               │
//! │   metadata · grids · formats · tilesets  │
//! └────────────────────┬─────────────────────┘
//!                      │ get_tileset(name)
//!                      ▼
//! ┌──────────────────────────────────────────┐
//! │                 Tileset                  │
//! │      GridLink[0] (default), GridLink[1]… │
//! └────────────────────┬─────────────────────┘
//!                      │
//!                      ▼
//! ┌──────────────────────────────────────────┐
//! │   Grid (extent, tile size, resolutions)  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! A [`Tile`] is created per request from a tileset, one of its grid links and
//! validated `(z, x, y)` coordinates.

mod configuration;
mod grid;
mod tile;
mod tileset;

pub use configuration::Configuration;
pub use grid::{BoundingBox, Grid, GridLink, GridUnits, TileLimits};
pub use tile::Tile;
pub use tileset::{ImageFormat, Tileset, DEFAULT_EXTENSION, DEFAULT_MIME_TYPE};
