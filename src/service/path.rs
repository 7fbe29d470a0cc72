//! Request path parsing shared by the tile protocols.
//!
//! Paths have the shape `/<layer>[@<grid>]/<z>/<x>/<y>.<ext>`. Parsing is a
//! forward-only state machine consuming one non-empty segment per state:
//!
//! ```text
//! Layer ──► Z ──► X ──► Y+ext ──► Done ──► (any further segment is an error)
//! ```
//!
//! The first failing state aborts the parse with its own error kind.

use std::sync::Arc;

use tracing::debug;

use crate::error::ServiceError;
use crate::model::{Configuration, GridLink, Tile, Tileset};

/// Separator between a tileset name and a grid name in a layer segment.
const GRID_SEPARATOR: char = '@';

/// Non-empty `/`-separated segments of `path`, in order.
///
/// Empty segments produced by leading, trailing or doubled slashes are skipped.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Resolve a layer segment to a tileset and grid link.
///
/// A segment naming a tileset directly binds its default (first) grid link.
/// Otherwise the segment is split at its first `@` into a tileset name and a
/// grid name, and the grid link with exactly that grid name is bound.
pub fn resolve_layer(
    service: &'static str,
    path: &str,
    segment: &str,
    config: &Configuration,
) -> Result<(Arc<Tileset>, Arc<GridLink>), ServiceError> {
    if let Some(tileset) = config.get_tileset(segment) {
        return Ok((
            Arc::clone(tileset),
            Arc::clone(tileset.default_grid_link()),
        ));
    }

    let Some((tileset_name, grid_name)) = segment.split_once(GRID_SEPARATOR) else {
        return Err(ServiceError::InvalidLayer {
            service,
            path: path.to_string(),
            layer: segment.to_string(),
        });
    };

    let tileset = config
        .get_tileset(tileset_name)
        .ok_or_else(|| ServiceError::InvalidLayer {
            service,
            path: path.to_string(),
            layer: tileset_name.to_string(),
        })?;

    let grid_link = tileset
        .grid_link(grid_name)
        .ok_or_else(|| ServiceError::InvalidGrid {
            service,
            path: path.to_string(),
            grid: grid_name.to_string(),
        })?;

    Ok((Arc::clone(tileset), Arc::clone(grid_link)))
}

// =============================================================================
// Tile Path
// =============================================================================

/// Which extension the `y.<ext>` segment must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionRule {
    /// A protocol-wide literal, e.g. `kml`
    Fixed(&'static str),

    /// The resolved tileset's image extension
    TilesetFormat,
}

/// A syntactically valid tile path, not yet checked against grid bounds.
#[derive(Debug, Clone)]
pub struct TilePath {
    pub tileset: Arc<Tileset>,
    pub grid_link: Arc<GridLink>,
    pub z: i64,
    pub x: i64,
    pub y: i64,
}

impl TilePath {
    /// Build the tile, rejecting coordinates outside the grid link.
    pub fn into_tile(self) -> Result<Tile, ServiceError> {
        Tile::new_validated(self.tileset, self.grid_link, self.z, self.x, self.y)
    }
}

enum State {
    Layer,
    Z {
        tileset: Arc<Tileset>,
        grid_link: Arc<GridLink>,
    },
    X {
        tileset: Arc<Tileset>,
        grid_link: Arc<GridLink>,
        z: i64,
    },
    Y {
        tileset: Arc<Tileset>,
        grid_link: Arc<GridLink>,
        z: i64,
        x: i64,
    },
    Done(TilePath),
}

/// Parse `<layer>/<z>/<x>/<y>.<ext>` from `segments`.
///
/// `path` is the raw request path, kept for error reporting only.
pub fn parse_tile_path<'a>(
    service: &'static str,
    path: &str,
    segments: impl IntoIterator<Item = &'a str>,
    config: &Configuration,
    extension: ExtensionRule,
) -> Result<TilePath, ServiceError> {
    let mut state = State::Layer;

    for segment in segments {
        state = match state {
            State::Layer => {
                let (tileset, grid_link) = resolve_layer(service, path, segment, config)?;
                State::Z { tileset, grid_link }
            }
            State::Z { tileset, grid_link } => {
                let z = parse_coordinate(segment).ok_or_else(|| ServiceError::InvalidZ {
                    service,
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;
                State::X {
                    tileset,
                    grid_link,
                    z,
                }
            }
            State::X {
                tileset,
                grid_link,
                z,
            } => {
                let x = parse_coordinate(segment).ok_or_else(|| ServiceError::InvalidX {
                    service,
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;
                State::Y {
                    tileset,
                    grid_link,
                    z,
                    x,
                }
            }
            State::Y {
                tileset,
                grid_link,
                z,
                x,
            } => {
                let (y, ext) = parse_row(segment).ok_or_else(|| ServiceError::InvalidY {
                    service,
                    path: path.to_string(),
                    segment: segment.to_string(),
                })?;
                let expected = match extension {
                    ExtensionRule::Fixed(fixed) => fixed,
                    ExtensionRule::TilesetFormat => tileset.extension(),
                };
                if ext != expected {
                    return Err(ServiceError::InvalidExtension {
                        service,
                        path: path.to_string(),
                        extension: ext.to_string(),
                    });
                }
                State::Done(TilePath {
                    tileset,
                    grid_link,
                    z,
                    x,
                    y,
                })
            }
            State::Done(_) => {
                return Err(ServiceError::TooManyArguments {
                    service,
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            }
        };
    }

    match state {
        State::Done(tile_path) => {
            debug!(
                service,
                tileset = tile_path.tileset.name(),
                grid = tile_path.grid_link.grid().name(),
                z = tile_path.z,
                x = tile_path.x,
                y = tile_path.y,
                "Parsed tile path"
            );
            Ok(tile_path)
        }
        _ => Err(ServiceError::WrongArgumentCount {
            service,
            path: path.to_string(),
        }),
    }
}

/// Base-10 integer making up the whole segment.
fn parse_coordinate(segment: &str) -> Option<i64> {
    segment.parse().ok()
}

/// `<integer>.<extension>`: the row number must be followed by a `.`.
///
/// An empty row such as `.kml` is rejected, never read as row 0.
fn parse_row(segment: &str) -> Option<(i64, &str)> {
    let (row, ext) = segment.split_once('.')?;
    Some((row.parse().ok()?, ext))
}
