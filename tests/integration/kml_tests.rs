//! KML super-overlay integration tests.
//!
//! Tests verify:
//! - Complete documents for intermediate and deepest levels
//! - Layer and grid resolution from the path
//! - Online resource precedence (configuration, base URL, Host header)
//! - Path parsing errors surfaced as 404 responses

use std::sync::Arc;

use axum::http::StatusCode;

use tile_services::{
    create_router, Configuration, EmptyTileSource, RouterConfig, ServiceRegistry,
};

use super::test_utils::{body_string, error_kind, get, test_router, test_router_with_config};

const KML_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";

// =============================================================================
// Documents
// =============================================================================

#[tokio::test]
async fn test_kml_intermediate_level() {
    let response = get(test_router(EmptyTileSource), "/kml/basetiles@WGS84/2/1/3.kml").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("content-type").unwrap(), KML_MIME_TYPE);
    assert!(response.headers().contains_key("cache-control"));

    let kml = body_string(response).await;
    assert!(kml.starts_with(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<kml xmlns=\"http://earth.google.com/kml/2.1\">\n"
    ));
    assert!(kml.contains("<minLodPixels>128</minLodPixels><maxLodPixels>512</maxLodPixels>"));
    assert!(kml.contains(
        "        <north>90.000000</north><south>45.000000</south>\n        <east>-90.000000</east><west>-135.000000</west>\n"
    ));
    assert!(kml.contains("<href>http://tiles.test/tms/1.0.0/basetiles@WGS84/2/1/3.png</href>"));

    assert_eq!(kml.matches("<NetworkLink>").count(), 4);
    for (name, href) in [
        ("263", "3/2/6"),
        ("273", "3/2/7"),
        ("363", "3/3/6"),
        ("373", "3/3/7"),
    ] {
        assert!(kml.contains(&format!("<name>{name}</name>")), "missing {name}");
        assert!(
            kml.contains(&format!(
                "<href>http://tiles.test/kml/basetiles@WGS84/{href}.kml</href>"
            )),
            "missing {href}"
        );
    }
    assert!(kml.ends_with("</Document>\n</kml>\n"));
}

#[tokio::test]
async fn test_kml_deepest_level() {
    let response = get(test_router(EmptyTileSource), "/kml/basetiles/4/31/15.kml").await;
    assert_eq!(response.status(), StatusCode::OK);

    let kml = body_string(response).await;
    assert!(kml.contains("<maxLodPixels>-1</maxLodPixels>"));
    assert!(!kml.contains("<NetworkLink>"));
    assert!(kml.contains("/tms/1.0.0/basetiles@WGS84/4/31/15.png"));
}

#[tokio::test]
async fn test_kml_bare_layer_uses_default_grid() {
    let bare = body_string(get(test_router(EmptyTileSource), "/kml/basetiles/1/0/0.kml").await).await;
    let explicit =
        body_string(get(test_router(EmptyTileSource), "/kml/basetiles@WGS84/1/0/0.kml").await)
            .await;
    assert_eq!(bare, explicit);
}

#[tokio::test]
async fn test_kml_secondary_grid() {
    // 5000000m restricted extent at level 0 covers tile (0, 0) only
    let response = get(
        test_router(EmptyTileSource),
        "/kml/basetiles@GoogleMapsCompatible/1/1/1.kml",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let kml = body_string(response).await;
    assert!(kml.contains("/tms/1.0.0/basetiles@GoogleMapsCompatible/1/1/1.png"));
    assert!(kml.contains("/kml/basetiles@GoogleMapsCompatible/2/2/2.kml"));
    assert!(kml.contains("<north>20037508.342789</north><south>0.000000</south>"));
}

#[tokio::test]
async fn test_kml_jpeg_tileset() {
    let kml = body_string(get(test_router(EmptyTileSource), "/kml/photos/0/0/0.kml").await).await;
    assert!(kml.contains("/tms/1.0.0/photos@WGS84/0/0/0.jpg"));
}

#[tokio::test]
async fn test_kml_is_deterministic() {
    let first = body_string(get(test_router(EmptyTileSource), "/kml/basetiles/3/5/2.kml").await).await;
    let second =
        body_string(get(test_router(EmptyTileSource), "/kml/basetiles/3/5/2.kml").await).await;
    assert_eq!(first, second);
}

// =============================================================================
// Online Resource
// =============================================================================

#[tokio::test]
async fn test_kml_configured_base_url() {
    let router = test_router_with_config(
        EmptyTileSource,
        RouterConfig::new()
            .with_tracing(false)
            .with_base_url("https://maps.example.com/cache/"),
    );
    let kml = body_string(get(router, "/kml/basetiles/0/0/0.kml").await).await;
    assert!(kml.contains("<href>https://maps.example.com/cache/tms/1.0.0/basetiles@WGS84/0/0/0.png</href>"));
    assert!(!kml.contains("tiles.test"));
}

#[tokio::test]
async fn test_kml_metadata_url_wins() {
    let config = Configuration::from_yaml_str(
        r#"
metadata:
  url: https://cdn.example.com/
tilesets:
  world:
    grids: [WGS84]
"#,
    )
    .unwrap();
    let router = create_router(
        ServiceRegistry::with_default_services(),
        Arc::new(config),
        EmptyTileSource,
        RouterConfig::new()
            .with_tracing(false)
            .with_base_url("https://ignored.example.com"),
    );

    let kml = body_string(get(router, "/kml/world/0/0/0.kml").await).await;
    assert!(kml.contains("<href>https://cdn.example.com/tms/1.0.0/world@WGS84/0/0/0.png</href>"));
    assert!(kml.contains("<href>https://cdn.example.com/kml/world@WGS84/1/0/0.kml</href>"));
    assert!(!kml.contains("ignored.example.com"));
}

// =============================================================================
// Errors
// =============================================================================

async fn assert_kml_error(uri: &str, expected: &str) {
    let response = get(test_router(EmptyTileSource), uri).await;
    let (status, kind) = error_kind(response).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
    assert_eq!(kind, expected, "{uri}");
}

#[tokio::test]
async fn test_kml_invalid_extension() {
    assert_kml_error("/kml/basetiles/0/0/0.xml", "invalid_extension").await;
    assert_kml_error("/kml/basetiles/0/0/0.png", "invalid_extension").await;
}

#[tokio::test]
async fn test_kml_invalid_layer() {
    assert_kml_error("/kml/unknown/0/0/0.kml", "invalid_layer").await;
    assert_kml_error("/kml/unknown@WGS84/0/0/0.kml", "invalid_layer").await;
}

#[tokio::test]
async fn test_kml_invalid_grid() {
    assert_kml_error("/kml/photos@GoogleMapsCompatible/0/0/0.kml", "invalid_grid").await;
}

#[tokio::test]
async fn test_kml_invalid_coordinates() {
    assert_kml_error("/kml/basetiles/a/0/0.kml", "invalid_z").await;
    assert_kml_error("/kml/basetiles/0/b/0.kml", "invalid_x").await;
    assert_kml_error("/kml/basetiles/0/0/c.kml", "invalid_y").await;
    assert_kml_error("/kml/basetiles/0/0/0", "invalid_y").await;
}

#[tokio::test]
async fn test_kml_wrong_argument_count() {
    assert_kml_error("/kml/basetiles/0/0", "wrong_argument_count").await;
    assert_kml_error("/kml/basetiles", "wrong_argument_count").await;
}

#[tokio::test]
async fn test_kml_too_many_arguments() {
    assert_kml_error("/kml/basetiles/0/0/0.kml/extra", "too_many_arguments").await;
}

#[tokio::test]
async fn test_kml_out_of_bounds() {
    assert_kml_error("/kml/basetiles/5/0/0.kml", "tile_out_of_bounds").await;
    assert_kml_error("/kml/basetiles/0/2/0.kml", "tile_out_of_bounds").await;
    assert_kml_error("/kml/basetiles@GoogleMapsCompatible/0/0/1.kml", "tile_out_of_bounds").await;
}
