//! Protocol services.
//!
//! A [`Service`] turns the path that follows its URL prefix into a typed
//! [`Request`], and builds capabilities documents for the requests it parsed.
//! The HTTP layer only sees this contract; protocol details stay in the
//! concrete services.
//!
//! ```text
//!  /kml/basetiles@WGS84/2/1/3.kml
//!   │    └───────────┬──────────┘
//!   │                ▼
//!   │   ServiceRegistry::dispatch ──► KmlService::parse_request
//!   │                                   segments → resolve_layer → parse z/x/y.ext
//!   │                                   → Tile::new_validated
//!   ▼                                          │
//!  prefix                      Request::GetCapabilities(Kml { tile })
//!                                              │
//!                              KmlService::create_capabilities_response
//!                                              ▼
//!                                   Capabilities { mime_type, body }
//! ```
//!
//! - [`kml`]: KML super-overlays, one lazily linked quadtree node per request
//! - [`tms`]: TMS 1.0.0 tiles and TileMapService/TileMap documents
//! - [`path`]: shared tokenizer, `layer[@grid]` resolver and tile coordinate parser
//! - [`registry`]: prefix → service table built at startup

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::model::{Configuration, GridLink, Tile, Tileset};

pub mod kml;
pub mod path;
pub mod registry;
pub mod tms;

pub use kml::KmlService;
pub use registry::ServiceRegistry;
pub use tms::TmsService;

/// Query parameters of the inbound request.
pub type Params = HashMap<String, String>;

// =============================================================================
// Service Type
// =============================================================================

/// Protocol implemented by a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Kml,
    Tms,
}

impl ServiceType {
    /// Lowercase protocol name, used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceType::Kml => "kml",
            ServiceType::Tms => "tms",
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A parsed protocol request.
#[derive(Debug, Clone)]
pub enum Request {
    /// Fetch the image of one tile from the tile backend
    GetTile(TileRequest),

    /// Build a capabilities document
    GetCapabilities(CapabilitiesRequest),
}

/// Request for a single tile image.
#[derive(Debug, Clone)]
pub struct TileRequest {
    pub tile: Tile,
}

/// Which capabilities document to build.
#[derive(Debug, Clone)]
pub enum CapabilitiesRequest {
    /// KML super-overlay node rooted at `tile`
    Kml { tile: Tile },

    /// TMS root document listing every tile map
    TmsService,

    /// TMS document describing one tileset under one grid
    TmsTileMap {
        tileset: Arc<Tileset>,
        grid_link: Arc<GridLink>,
    },
}

/// A generated capabilities document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    pub mime_type: &'static str,
    pub body: String,
}

// =============================================================================
// Service Trait
// =============================================================================

/// Contract between the dispatcher and a protocol implementation.
///
/// Services are created once at startup and shared by all requests; they hold
/// no per-request state.
pub trait Service: Send + Sync {
    /// URL prefix the service is mounted under (e.g. `kml`).
    fn url_prefix(&self) -> &str;

    fn service_type(&self) -> ServiceType;

    /// Parse the path that follows the URL prefix.
    ///
    /// The first failure aborts parsing; no partial request is returned.
    fn parse_request(
        &self,
        path: &str,
        params: &Params,
        config: &Configuration,
    ) -> Result<Request, ServiceError>;

    /// Build the capabilities document for a request this service parsed.
    ///
    /// `base_url` is the URL the server is reached at; the configuration's
    /// `url` metadata takes precedence over it.
    fn create_capabilities_response(
        &self,
        request: &CapabilitiesRequest,
        base_url: &str,
        config: &Configuration,
    ) -> Result<Capabilities, ServiceError>;
}

/// Base URL for generated links, without a trailing slash.
pub(crate) fn online_resource<'a>(config: &'a Configuration, base_url: &'a str) -> &'a str {
    config
        .online_resource()
        .unwrap_or(base_url)
        .trim_end_matches('/')
}

/// Base URL for links into one tileset; its own `url` metadata wins.
pub(crate) fn tileset_online_resource<'a>(
    tileset: &'a Tileset,
    config: &'a Configuration,
    base_url: &'a str,
) -> &'a str {
    match tileset.metadata("url") {
        Some(url) => url.trim_end_matches('/'),
        None => online_resource(config, base_url),
    }
}

/// Escape text for use in XML content and attribute values.
pub(crate) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
