//! # Tile Services
//!
//! Protocol services for a map tile cache: KML super-overlays and TMS 1.0.0.
//!
//! A KML request names one tile of a tileset's pyramid and returns a small
//! KML document that draws that tile and links to its four children, so
//! virtual-globe viewers load the pyramid lazily as the user zooms in.
//!
//! ## Features
//!
//! - **KML super-overlays**: one region-based document per pyramid node
//! - **TMS**: TileMapService and TileMap documents, plus tile images
//! - **Grid model**: built-in WGS84 and GoogleMapsCompatible grids, custom
//!   grids and restricted extents from a YAML configuration
//! - **Pluggable tile backends**: tiles are read through the [`TileSource`] trait
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`model`] - Grids, tilesets, tiles and the configuration holding them
//! - [`service`] - Protocol services and the registry dispatching to them
//! - [`source`] - Tile backends
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tile_services::{create_router, Configuration, EmptyTileSource, RouterConfig, ServiceRegistry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Arc::new(Configuration::load("tiles.yaml").expect("valid configuration"));
//!     let router = create_router(
//!         ServiceRegistry::with_default_services(),
//!         config,
//!         EmptyTileSource,
//!         RouterConfig::new(),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod service;
pub mod source;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ServeConfig};
pub use error::{ConfigError, ServiceError, TileSourceError};
pub use model::{BoundingBox, Configuration, Grid, GridLink, GridUnits, ImageFormat, Tile, Tileset};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
pub use service::{
    kml::generate_kml, Capabilities, CapabilitiesRequest, KmlService, Request, Service,
    ServiceRegistry, ServiceType, TmsService,
};
pub use source::{DirectoryTileSource, EmptyTileSource, TileSource};
