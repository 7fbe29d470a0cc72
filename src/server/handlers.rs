//! HTTP request handlers for the tile protocol services.
//!
//! Every protocol request goes through the same two steps: the service
//! registry parses the path into a typed request, then the handler either
//! builds a capabilities document or fetches a tile from the tile source.
//!
//! # Endpoints
//!
//! - `GET /{service}` and `GET /{service}/{*path}` - Protocol requests
//! - `GET /health` - Health check endpoint

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{ServiceError, TileSourceError};
use crate::model::Configuration;
use crate::service::{Request, ServiceRegistry};
use crate::source::TileSource;

/// Default Cache-Control max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: TileSource> {
    /// Protocol services by URL prefix
    pub registry: Arc<ServiceRegistry>,

    /// Tilesets and grids requests are resolved against
    pub config: Arc<Configuration>,

    /// Backend tile images are read from
    pub source: Arc<S>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Externally visible base URL; derived from request headers when unset
    pub base_url: Option<String>,
}

impl<S: TileSource> AppState<S> {
    /// Create a new application state.
    pub fn new(registry: ServiceRegistry, config: Arc<Configuration>, source: S) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
            source: Arc::new(source),
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            base_url: None,
        }
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }

    /// Set the base URL used in generated links.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url;
        self
    }
}

impl<S: TileSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: Arc::clone(&self.config),
            source: Arc::clone(&self.source),
            cache_max_age: self.cache_max_age,
            base_url: self.base_url.clone(),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "invalid_layer", "tile_not_found")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Log an error according to its status and build the JSON response.
///
/// 5xx errors are logged at ERROR, 404s at DEBUG, other 4xx at WARN.
fn error_response(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else if status == StatusCode::NOT_FOUND {
        debug!(
            error_type = error_type,
            status = status.as_u16(),
            "Resource not found: {}",
            message
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let error_response = ErrorResponse::with_status(error_type, message, status);
    (status, Json(error_response)).into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.kind(), self.to_string())
    }
}

impl IntoResponse for TileSourceError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            TileSourceError::NotFound(_) => (StatusCode::NOT_FOUND, "tile_not_found"),
            TileSourceError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "tile_read_error"),
        };
        error_response(status, error_type, self.to_string())
    }
}

/// Error returned by the protocol handlers.
#[derive(Debug)]
pub enum HandlerError {
    Service(ServiceError),
    Source(TileSourceError),
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        match self {
            HandlerError::Service(err) => err.into_response(),
            HandlerError::Source(err) => err.into_response(),
        }
    }
}

impl From<ServiceError> for HandlerError {
    fn from(err: ServiceError) -> Self {
        HandlerError::Service(err)
    }
}

impl From<TileSourceError> for HandlerError {
    fn from(err: TileSourceError) -> Self {
        HandlerError::Source(err)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle a protocol request addressed to the service root.
///
/// # Endpoint
///
/// `GET /{service}`
pub async fn service_root_handler<S: TileSource>(
    State(state): State<AppState<S>>,
    Path(service): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    handle_request(&state, &service, "/", &params, &headers).await
}

/// Handle a protocol request.
///
/// # Endpoint
///
/// `GET /{service}/{*path}`, e.g. `/kml/basetiles@WGS84/2/1/3.kml`
///
/// # Response
///
/// - `200 OK`: capabilities document with the service's MIME type, or a tile
///   image with the tileset's MIME type
/// - `404 Not Found`: unknown service, unparsable path, tile outside the grid
///   or missing from the tile source
/// - `500 Internal Server Error`: tile source failure
///
/// # Headers
///
/// - `Cache-Control: public, max-age={cache_max_age}`
pub async fn service_handler<S: TileSource>(
    State(state): State<AppState<S>>,
    Path((service, path)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, HandlerError> {
    let path = format!("/{path}");
    handle_request(&state, &service, &path, &params, &headers).await
}

async fn handle_request<S: TileSource>(
    state: &AppState<S>,
    prefix: &str,
    path: &str,
    params: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<Response, HandlerError> {
    let (service, request) = state
        .registry
        .dispatch(prefix, path, params, &state.config)?;
    let cache_control = format!("public, max-age={}", state.cache_max_age);

    match request {
        Request::GetCapabilities(request) => {
            let base_url = request_base_url(state.base_url.as_deref(), headers);
            let capabilities =
                service.create_capabilities_response(&request, &base_url, &state.config)?;
            debug!(
                service = prefix,
                path = path,
                mime_type = capabilities.mime_type,
                "Built capabilities"
            );

            Ok((
                [
                    (header::CONTENT_TYPE, capabilities.mime_type.to_string()),
                    (header::CACHE_CONTROL, cache_control),
                ],
                capabilities.body,
            )
                .into_response())
        }
        Request::GetTile(request) => {
            let tile = request.tile;
            let data = state.source.get_tile(&tile).await?;
            debug!(
                service = prefix,
                tileset = tile.tileset().name(),
                z = tile.z(),
                x = tile.x(),
                y = tile.y(),
                bytes = data.len(),
                "Served tile"
            );

            Ok((
                [
                    (header::CONTENT_TYPE, tile.tileset().mime_type().to_string()),
                    (header::CACHE_CONTROL, cache_control),
                ],
                data,
            )
                .into_response())
        }
    }
}

/// Base URL the client reached the server at.
///
/// A configured base URL wins; otherwise it is rebuilt from the
/// `X-Forwarded-Proto` and `Host` headers.
pub fn request_base_url(configured: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base_url) = configured {
        return base_url.trim_end_matches('/').to_string();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{scheme}://{host}")
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
