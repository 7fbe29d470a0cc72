use http::StatusCode;
use thiserror::Error;

/// Errors raised while parsing a protocol request or building its capabilities.
///
/// Every client-input variant keeps the raw request path and, where there is
/// one, the segment that caused the failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Layer segment names no tileset, directly or through `layer@grid`
    #[error("received {service} request {path} with invalid layer {layer}")]
    InvalidLayer {
        service: &'static str,
        path: String,
        layer: String,
    },

    /// Grid named after `@` is not linked to the tileset
    #[error("received {service} request {path} with invalid grid {grid}")]
    InvalidGrid {
        service: &'static str,
        path: String,
        grid: String,
    },

    /// Non-numeric zoom level segment
    #[error("received {service} request {path} with invalid z {segment}")]
    InvalidZ {
        service: &'static str,
        path: String,
        segment: String,
    },

    /// Non-numeric column segment
    #[error("received {service} request {path} with invalid x {segment}")]
    InvalidX {
        service: &'static str,
        path: String,
        segment: String,
    },

    /// Row segment that is not `<digits>.<extension>`
    #[error("received {service} request {path} with invalid y {segment}")]
    InvalidY {
        service: &'static str,
        path: String,
        segment: String,
    },

    /// Extension after `y.` differs from the one the service expects
    #[error("received {service} request {path} with invalid extension {extension}")]
    InvalidExtension {
        service: &'static str,
        path: String,
        extension: String,
    },

    /// Fewer segments than the protocol requires
    #[error("received {service} request {path} with wrong number of arguments")]
    WrongArgumentCount { service: &'static str, path: String },

    /// A segment past the last one the protocol accepts
    #[error("received {service} request {path} with invalid parameter {segment}")]
    TooManyArguments {
        service: &'static str,
        path: String,
        segment: String,
    },

    /// Well-formed coordinates outside the grid link's tile range
    #[error("tile (z={z}, x={x}, y={y}) is outside grid {grid} of tileset {tileset}")]
    TileOutOfBounds {
        tileset: String,
        grid: String,
        z: i64,
        x: i64,
        y: i64,
    },

    /// Protocol version segment the service does not speak
    #[error("received {service} request {path} with unsupported version {version}")]
    InvalidVersion {
        service: &'static str,
        path: String,
        version: String,
    },

    /// No service registered for the URL prefix
    #[error("no service registered for prefix {prefix}")]
    UnknownService { prefix: String },

    /// A service was handed a capabilities request produced by another service
    #[error("{service} service cannot build capabilities for this request")]
    UnsupportedRequest { service: &'static str },
}

impl ServiceError {
    /// HTTP status the transport layer should answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::UnsupportedRequest { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::NOT_FOUND,
        }
    }

    /// Short machine-readable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::InvalidLayer { .. } => "invalid_layer",
            ServiceError::InvalidGrid { .. } => "invalid_grid",
            ServiceError::InvalidZ { .. } => "invalid_z",
            ServiceError::InvalidX { .. } => "invalid_x",
            ServiceError::InvalidY { .. } => "invalid_y",
            ServiceError::InvalidExtension { .. } => "invalid_extension",
            ServiceError::WrongArgumentCount { .. } => "wrong_argument_count",
            ServiceError::TooManyArguments { .. } => "too_many_arguments",
            ServiceError::TileOutOfBounds { .. } => "tile_out_of_bounds",
            ServiceError::InvalidVersion { .. } => "invalid_version",
            ServiceError::UnknownService { .. } => "unknown_service",
            ServiceError::UnsupportedRequest { .. } => "unsupported_request",
        }
    }
}

/// Errors raised while loading or validating the tileset configuration
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read configuration {path}: {message}")]
    Read { path: String, message: String },

    /// Configuration file is not valid YAML for the expected schema
    #[error("invalid configuration: {0}")]
    Syntax(String),

    /// A grid definition is geometrically unusable
    #[error("invalid grid {grid}: {message}")]
    InvalidGrid { grid: String, message: String },

    /// A tileset or grid name cannot be addressed in a request path
    #[error("invalid name {name:?}: {message}")]
    InvalidName { name: String, message: String },

    /// Tileset references a grid that is neither built in nor configured
    #[error("tileset {tileset} references unknown grid {grid}")]
    UnknownGrid { tileset: String, grid: String },

    /// Tileset references an image format that is not defined
    #[error("tileset {tileset} references unknown format {format}")]
    UnknownFormat { tileset: String, format: String },

    /// Tileset has no grid to be served under
    #[error("tileset {tileset} has no grids")]
    NoGrids { tileset: String },

    /// The `url` metadata entry is not an absolute URL
    #[error("invalid online resource {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors raised by a tile backend
#[derive(Debug, Clone, Error)]
pub enum TileSourceError {
    /// Tile does not exist in the backend
    #[error("tile not found: {0}")]
    NotFound(String),

    /// Backend failed to read the tile
    #[error("tile read error: {0}")]
    Io(String),
}
