//! API integration tests for routing, headers and error handling.
//!
//! Tests verify:
//! - Health check
//! - Dispatch to registered services and unknown prefixes
//! - Tile retrieval through the tile source
//! - HTTP response codes and headers

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use tile_services::{DirectoryTileSource, EmptyTileSource, RouterConfig};

use super::test_utils::{
    body_bytes, body_string, error_kind, get, test_router, test_router_with_config,
    FailingTileSource, MockTileSource,
};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let response = get(test_router(EmptyTileSource), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// Dispatch
// =============================================================================

#[tokio::test]
async fn test_unknown_service_prefix() {
    let response = get(test_router(EmptyTileSource), "/wmts/1.0.0/WMTSCapabilities.xml").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(kind, "unknown_service");
}

#[tokio::test]
async fn test_unknown_service_root() {
    let response = get(test_router(EmptyTileSource), "/wms").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(kind, "unknown_service");
}

#[tokio::test]
async fn test_error_body_shape() {
    let response = get(test_router(EmptyTileSource), "/kml/missing/0/0/0.kml").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let body = body_string(response).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "invalid_layer");
    assert_eq!(json["status"], 404);
    assert_eq!(
        json["message"],
        "received kml request /missing/0/0/0.kml with invalid layer missing"
    );
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_tile_retrieval_success() {
    let source = MockTileSource::new().with_tile("basetiles@WGS84/1/2/1", b"\x89PNG tile");
    let response = get(test_router(source.clone()), "/tms/1.0.0/basetiles/1/2/1.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/png");
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(&body_bytes(response).await[..], b"\x89PNG tile");
    assert_eq!(source.request_count(), 1);
}

#[tokio::test]
async fn test_tile_uses_tileset_mime_type() {
    let source = MockTileSource::new().with_tile("photos@WGS84/0/1/0", b"\xff\xd8jpeg");
    let response = get(test_router(source), "/tms/1.0.0/photos/0/1/0.jpg").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), "image/jpeg");
}

#[tokio::test]
async fn test_tile_missing_from_source() {
    let response = get(test_router(MockTileSource::new()), "/tms/1.0.0/basetiles/0/0/0.png").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(kind, "tile_not_found");
}

#[tokio::test]
async fn test_tile_without_backend() {
    let response = get(test_router(EmptyTileSource), "/tms/1.0.0/basetiles/0/0/0.png").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(kind, "tile_not_found");
}

#[tokio::test]
async fn test_tile_source_failure() {
    let response = get(test_router(FailingTileSource), "/tms/1.0.0/basetiles/0/0/0.png").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(kind, "tile_read_error");
}

#[tokio::test]
async fn test_out_of_bounds_tile_skips_source() {
    let source = MockTileSource::new();
    let response = get(test_router(source.clone()), "/tms/1.0.0/basetiles/0/5/0.png").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(kind, "tile_out_of_bounds");
    assert_eq!(source.request_count(), 0);
}

#[tokio::test]
async fn test_directory_tile_source() {
    let dir = tempfile::tempdir().unwrap();
    let tile_dir = dir.path().join("basetiles/WGS84/2/3");
    std::fs::create_dir_all(&tile_dir).unwrap();
    std::fs::write(tile_dir.join("2.png"), b"\x89PNG from disk").unwrap();

    let router = test_router(DirectoryTileSource::new(dir.path()));
    let response = get(router.clone(), "/tms/1.0.0/basetiles@WGS84/2/3/2.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"\x89PNG from disk");

    let response = get(router, "/tms/1.0.0/basetiles@WGS84/2/3/3.png").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(kind, "tile_not_found");
}

// =============================================================================
// Headers
// =============================================================================

#[tokio::test]
async fn test_custom_cache_max_age() {
    let router = test_router_with_config(
        EmptyTileSource,
        RouterConfig::new().with_tracing(false).with_cache_max_age(60),
    );
    let response = get(router, "/kml/basetiles/0/0/0.kml").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("cache-control").unwrap(),
        "public, max-age=60"
    );
}

#[tokio::test]
async fn test_cors_any_origin() {
    let request = Request::builder()
        .uri("/tms/1.0.0")
        .header("origin", "https://viewer.example.com")
        .body(Body::empty())
        .unwrap();
    let response = test_router(EmptyTileSource).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_origin() {
    let router = test_router_with_config(
        EmptyTileSource,
        RouterConfig::new()
            .with_tracing(false)
            .with_cors_origins(vec!["https://viewer.example.com".to_string()]),
    );

    let request = Request::builder()
        .uri("/tms/1.0.0")
        .header("origin", "https://other.example.com")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}
