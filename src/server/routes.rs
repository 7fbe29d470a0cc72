//! Router configuration for the tile services.
//!
//! # Route Structure
//!
//! ```text
//! /health                      - Health check
//! /{service}                   - Service root (e.g. /tms)
//! /{service}/{*path}           - Protocol request (e.g. /kml/basetiles/0/0/0.kml)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tile_services::model::Configuration;
//! use tile_services::server::{create_router, RouterConfig};
//! use tile_services::service::ServiceRegistry;
//! use tile_services::source::DirectoryTileSource;
//!
//! let config = Arc::new(Configuration::load("tiles.yaml")?);
//! let router = create_router(
//!     ServiceRegistry::with_default_services(),
//!     config,
//!     DirectoryTileSource::new("/var/cache/tiles"),
//!     RouterConfig::new().with_cache_max_age(600),
//! );
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    health_handler, service_handler, service_root_handler, AppState, DEFAULT_CACHE_MAX_AGE,
};
use crate::model::Configuration;
use crate::service::ServiceRegistry;
use crate::source::TileSource;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Externally visible base URL for generated links
    pub base_url: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    /// - The base URL is derived from request headers
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
            base_url: None,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the base URL used in generated links.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Requests under `/{service}` are dispatched through `registry`; tiles are
/// read from `source`.
pub fn create_router<S>(
    registry: ServiceRegistry,
    config: Arc<Configuration>,
    source: S,
    router_config: RouterConfig,
) -> Router
where
    S: TileSource + 'static,
{
    let app_state = AppState::new(registry, config, source)
        .with_cache_max_age(router_config.cache_max_age)
        .with_base_url(router_config.base_url.clone());

    let cors = build_cors_layer(&router_config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/{service}", get(service_root_handler::<S>))
        .route("/{service}/{*path}", get(service_handler::<S>))
        .with_state(app_state)
        .layer(cors);

    if router_config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        // No origins allowed
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
