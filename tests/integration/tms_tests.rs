//! TMS integration tests.
//!
//! Tests verify:
//! - TileMapService and TileMap documents
//! - Version handling
//! - Tile requests sharing the KML path parser

use axum::http::StatusCode;

use tile_services::EmptyTileSource;

use super::test_utils::{body_string, error_kind, get, test_router};

#[tokio::test]
async fn test_tile_map_service_document() {
    for uri in ["/tms", "/tms/1.0.0"] {
        let response = get(test_router(EmptyTileSource), uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(response.headers().get("content-type").unwrap(), "text/xml");

        let doc = body_string(response).await;
        assert!(doc.contains(r#"<TileMapService version="1.0.0">"#));
        assert!(doc.contains("<Title>Fixture tiles</Title>"));
        assert!(doc.contains("<Abstract>Tiles for integration tests</Abstract>"));
        assert_eq!(doc.matches("<TileMap ").count(), 3);
        assert!(doc.contains(r#"href="http://tiles.test/tms/1.0.0/basetiles@WGS84/""#));
        assert!(doc.contains(r#"href="http://tiles.test/tms/1.0.0/basetiles@GoogleMapsCompatible/""#));
        assert!(doc.contains(r#"href="http://tiles.test/tms/1.0.0/photos@WGS84/""#));
    }
}

#[tokio::test]
async fn test_tile_map_document() {
    let response = get(test_router(EmptyTileSource), "/tms/1.0.0/basetiles").await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc = body_string(response).await;
    assert!(doc.contains("<Title>Base tiles</Title>"));
    assert!(doc.contains("<SRS>EPSG:4326</SRS>"));
    assert!(doc.contains(r#"<TileSets profile="global-geodetic">"#));
    assert_eq!(doc.matches("<TileSet ").count(), 5);
    assert!(doc.contains(r#"href="http://tiles.test/tms/1.0.0/basetiles@WGS84/4""#));
}

#[tokio::test]
async fn test_tile_map_restricted_grid() {
    let response = get(
        test_router(EmptyTileSource),
        "/tms/1.0.0/basetiles@GoogleMapsCompatible",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc = body_string(response).await;
    assert!(doc.contains("<SRS>EPSG:3857</SRS>"));
    assert!(doc.contains(
        r#"<BoundingBox minx="0.000000" miny="0.000000" maxx="5000000.000000" maxy="5000000.000000"/>"#
    ));
    assert_eq!(doc.matches("<TileSet ").count(), 19);
}

#[tokio::test]
async fn test_unsupported_version() {
    let response = get(test_router(EmptyTileSource), "/tms/2.0.0/basetiles").await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(kind, "invalid_version");
}

#[tokio::test]
async fn test_tile_errors() {
    let cases = [
        ("/tms/1.0.0/missing", "invalid_layer"),
        ("/tms/1.0.0/basetiles@EPSG:2154", "invalid_grid"),
        ("/tms/1.0.0/basetiles/0/0", "wrong_argument_count"),
        ("/tms/1.0.0/basetiles/0/0/0.jpg", "invalid_extension"),
        ("/tms/1.0.0/photos/0/0/0.png", "invalid_extension"),
        ("/tms/1.0.0/basetiles/0/0/0.png/1", "too_many_arguments"),
        ("/tms/1.0.0/basetiles/9/0/0.png", "tile_out_of_bounds"),
    ];

    for (uri, expected) in cases {
        let response = get(test_router(EmptyTileSource), uri).await;
        let (status, kind) = error_kind(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(kind, expected, "{uri}");
    }
}
