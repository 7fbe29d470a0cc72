//! Test utilities for integration tests.
//!
//! This module provides a mock tile source, a fixture configuration and
//! helpers for driving the router.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tile_services::error::TileSourceError;
use tile_services::model::{Configuration, Tile};
use tile_services::source::TileSource;
use tile_services::{create_router, RouterConfig, ServiceRegistry};

/// Fixture configuration.
///
/// `WGS84` is replaced by a five level variant so the deepest level is easy to
/// reach; `basetiles` also has a restricted web mercator link.
pub const FIXTURE_CONFIG: &str = r#"
metadata:
  title: Fixture tiles
  abstract: Tiles for integration tests

grids:
  WGS84:
    srs: EPSG:4326
    units: dd
    extent: [-180, -90, 180, 90]
    resolutions: [0.703125, 0.3515625, 0.17578125, 0.087890625, 0.0439453125]

tilesets:
  basetiles:
    grids:
      - WGS84
      - grid: GoogleMapsCompatible
        extent: [0, 0, 5000000, 5000000]
    metadata:
      title: Base tiles
  photos:
    grids: [WGS84]
    format: JPEG
"#;

/// Base URL used by test requests through the Host header.
pub const TEST_HOST: &str = "tiles.test";

pub fn fixture_config() -> Arc<Configuration> {
    Arc::new(Configuration::from_yaml_str(FIXTURE_CONFIG).unwrap())
}

// =============================================================================
// Mock Tile Source
// =============================================================================

/// In-memory tile source keyed by `tileset@grid/z/x/y`.
#[derive(Clone, Default)]
pub struct MockTileSource {
    tiles: Arc<HashMap<String, Bytes>>,
    request_count: Arc<AtomicUsize>,
}

impl MockTileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tile(mut self, key: &str, data: &'static [u8]) -> Self {
        let mut tiles = (*self.tiles).clone();
        tiles.insert(key.to_string(), Bytes::from_static(data));
        self.tiles = Arc::new(tiles);
        self
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

pub fn tile_key(tile: &Tile) -> String {
    format!(
        "{}@{}/{}/{}/{}",
        tile.tileset().name(),
        tile.grid_link().grid().name(),
        tile.z(),
        tile.x(),
        tile.y()
    )
}

#[async_trait]
impl TileSource for MockTileSource {
    async fn get_tile(&self, tile: &Tile) -> Result<Bytes, TileSourceError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        let key = tile_key(tile);
        self.tiles
            .get(&key)
            .cloned()
            .ok_or(TileSourceError::NotFound(key))
    }
}

/// Tile source that always fails with an I/O error.
pub struct FailingTileSource;

#[async_trait]
impl TileSource for FailingTileSource {
    async fn get_tile(&self, _tile: &Tile) -> Result<Bytes, TileSourceError> {
        Err(TileSourceError::Io("disk unavailable".to_string()))
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

pub fn test_router<S: TileSource + 'static>(source: S) -> Router {
    test_router_with_config(source, RouterConfig::new().with_tracing(false))
}

pub fn test_router_with_config<S: TileSource + 'static>(
    source: S,
    router_config: RouterConfig,
) -> Router {
    create_router(
        ServiceRegistry::with_default_services(),
        fixture_config(),
        source,
        router_config,
    )
}

/// Send a GET request for `uri` with the test Host header.
pub async fn get(router: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("host", TEST_HOST)
        .body(Body::empty())
        .unwrap();
    router.oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await.to_vec()).unwrap()
}

/// Parse a JSON error body and return its `error` field.
pub async fn error_kind(response: Response<Body>) -> (StatusCode, String) {
    let status = response.status();
    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json["error"].as_str().unwrap().to_string())
}
