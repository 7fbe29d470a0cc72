//! KML super-overlay service.
//!
//! Requests look like `/kml/<layer>[@<grid>]/<z>/<x>/<y>.kml` and return a KML
//! document for one node of the tile pyramid:
//!
//! - a `<Region>` whose level-of-detail range makes the node visible from
//!   128 pixels on screen, and hands over to its children beyond 512 pixels
//!   (never at the deepest level)
//! - a `<GroundOverlay>` pointing at the tile image served by the TMS service
//! - below the deepest level, one `<NetworkLink>` per child quadrant, pointing
//!   back at this service for the child tile
//!
//! Children are linked, not embedded, so each response has constant size and
//! viewers only fetch the parts of the pyramid they navigate to.
//!
//! # Example Output (deepest level, no children)
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <kml xmlns="http://earth.google.com/kml/2.1">
//!   <Document>
//!     <Region>
//!       <Lod>
//!         <minLodPixels>128</minLodPixels><maxLodPixels>-1</maxLodPixels>
//!       </Lod>
//!       <LatLonAltBox>
//!         <north>90.000000</north><south>0.000000</south>
//!         <east>0.000000</east><west>-90.000000</west>
//!       </LatLonAltBox>
//!     </Region>
//!     <GroundOverlay>
//!       <drawOrder>0</drawOrder>
//!       <Icon>
//!         <href>http://localhost:3000/tms/1.0.0/basetiles@WGS84/1/1/1.png</href>
//!       </Icon>
//!       <LatLonBox>
//!         <north>90.000000</north><south>0.000000</south>
//!         <east>0.000000</east><west>-90.000000</west>
//!       </LatLonBox>
//!     </GroundOverlay>
//!   </Document>
//! </kml>
//! ```

use std::fmt;

use crate::error::ServiceError;
use crate::model::{BoundingBox, Configuration, Tile};

use super::path::{parse_tile_path, segments, ExtensionRule};
use super::{
    tileset_online_resource, xml_escape, Capabilities, CapabilitiesRequest, Params, Request, Service,
    ServiceType,
};

/// MIME type of generated documents.
pub const KML_MIME_TYPE: &str = "application/vnd.google-earth.kml+xml";

/// Extension every KML request path must end with.
pub const KML_EXTENSION: &str = "kml";

/// On-screen size in pixels from which a region becomes active.
pub const MIN_LOD_PIXELS: i32 = 128;

/// On-screen size in pixels beyond which a region hands over to its children.
pub const MAX_LOD_PIXELS: i32 = 512;

/// `maxLodPixels` value meaning "active however large the region gets".
pub const UNBOUNDED_LOD_PIXELS: i32 = -1;

// =============================================================================
// Service
// =============================================================================

/// KML super-overlay protocol service.
#[derive(Debug, Clone)]
pub struct KmlService {
    url_prefix: String,
}

impl Default for KmlService {
    fn default() -> Self {
        Self::new()
    }
}

impl KmlService {
    pub fn new() -> Self {
        Self {
            url_prefix: "kml".to_string(),
        }
    }
}

impl Service for KmlService {
    fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    fn service_type(&self) -> ServiceType {
        ServiceType::Kml
    }

    fn parse_request(
        &self,
        path: &str,
        _params: &Params,
        config: &Configuration,
    ) -> Result<Request, ServiceError> {
        let tile = parse_tile_path(
            ServiceType::Kml.name(),
            path,
            segments(path),
            config,
            ExtensionRule::Fixed(KML_EXTENSION),
        )?
        .into_tile()?;

        Ok(Request::GetCapabilities(CapabilitiesRequest::Kml { tile }))
    }

    fn create_capabilities_response(
        &self,
        request: &CapabilitiesRequest,
        base_url: &str,
        config: &Configuration,
    ) -> Result<Capabilities, ServiceError> {
        let CapabilitiesRequest::Kml { tile } = request else {
            return Err(ServiceError::UnsupportedRequest {
                service: ServiceType::Kml.name(),
            });
        };

        Ok(Capabilities {
            mime_type: KML_MIME_TYPE,
            body: generate_kml(
                tile,
                tileset_online_resource(tile.tileset(), config, base_url),
            ),
        })
    }
}

// =============================================================================
// Document Generation
// =============================================================================

/// Generate the super-overlay document for `tile`.
///
/// `online_resource` is the base URL of the server, without a trailing slash.
/// The output depends only on its inputs.
pub fn generate_kml(tile: &Tile, online_resource: &str) -> String {
    SuperOverlay {
        tile,
        online_resource: &xml_escape(online_resource),
    }
    .to_string()
}

/// One quadtree node of a super-overlay, rendered through `Display`.
struct SuperOverlay<'a> {
    tile: &'a Tile,
    online_resource: &'a str,
}

impl SuperOverlay<'_> {
    /// `<tileset>@<grid>` as it appears in generated links.
    fn layer(&self) -> String {
        format!(
            "{}@{}",
            self.tile.tileset().name(),
            self.tile.grid_link().grid().name()
        )
    }

    fn write_ground_overlay(&self, f: &mut fmt::Formatter<'_>, bbox: &BoundingBox) -> fmt::Result {
        let tile = self.tile;
        writeln!(f, "    <GroundOverlay>")?;
        writeln!(f, "      <drawOrder>0</drawOrder>")?;
        writeln!(f, "      <Icon>")?;
        writeln!(
            f,
            "        <href>{}/tms/1.0.0/{}/{}/{}/{}.{}</href>",
            self.online_resource,
            self.layer(),
            tile.z(),
            tile.x(),
            tile.y(),
            tile.tileset().extension()
        )?;
        writeln!(f, "      </Icon>")?;
        writeln!(f, "      <LatLonBox>")?;
        write_edges(f, "        ", bbox)?;
        writeln!(f, "      </LatLonBox>")?;
        writeln!(f, "    </GroundOverlay>")
    }

    fn write_network_link(&self, f: &mut fmt::Formatter<'_>, child: &Tile) -> fmt::Result {
        writeln!(f, "    <NetworkLink>")?;
        writeln!(f, "      <name>{}{}{}</name>", child.x(), child.y(), child.z())?;
        write_region(f, "      ", UNBOUNDED_LOD_PIXELS, &child.bbox())?;
        writeln!(f, "      <Link>")?;
        writeln!(
            f,
            "        <href>{}/kml/{}/{}/{}/{}.{}</href>",
            self.online_resource,
            self.layer(),
            child.z(),
            child.x(),
            child.y(),
            KML_EXTENSION
        )?;
        writeln!(f, "        <viewRefreshMode>onRegion</viewRefreshMode>")?;
        writeln!(f, "      </Link>")?;
        writeln!(f, "    </NetworkLink>")
    }
}

impl fmt::Display for SuperOverlay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tile = self.tile;
        let bbox = tile.bbox();
        let max_lod = if tile.is_deepest_level() {
            UNBOUNDED_LOD_PIXELS
        } else {
            MAX_LOD_PIXELS
        };

        writeln!(f, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(f, r#"<kml xmlns="http://earth.google.com/kml/2.1">"#)?;
        writeln!(f, "  <Document>")?;
        write_region(f, "    ", max_lod, &bbox)?;
        self.write_ground_overlay(f, &bbox)?;

        for i in 0..=1 {
            for j in 0..=1 {
                if let Some(child) = tile.child(i, j) {
                    self.write_network_link(f, &child)?;
                }
            }
        }

        writeln!(f, "  </Document>")?;
        writeln!(f, "</kml>")
    }
}

fn write_region(
    f: &mut fmt::Formatter<'_>,
    indent: &str,
    max_lod: i32,
    bbox: &BoundingBox,
) -> fmt::Result {
    writeln!(f, "{indent}<Region>")?;
    writeln!(f, "{indent}  <Lod>")?;
    writeln!(
        f,
        "{indent}    <minLodPixels>{MIN_LOD_PIXELS}</minLodPixels><maxLodPixels>{max_lod}</maxLodPixels>"
    )?;
    writeln!(f, "{indent}  </Lod>")?;
    writeln!(f, "{indent}  <LatLonAltBox>")?;
    write_edges(f, &format!("{indent}    "), bbox)?;
    writeln!(f, "{indent}  </LatLonAltBox>")?;
    writeln!(f, "{indent}</Region>")
}

/// Edges in north, south, east, west order.
fn write_edges(f: &mut fmt::Formatter<'_>, indent: &str, bbox: &BoundingBox) -> fmt::Result {
    writeln!(
        f,
        "{indent}<north>{:.6}</north><south>{:.6}</south>",
        bbox.north(),
        bbox.south()
    )?;
    writeln!(
        f,
        "{indent}<east>{:.6}</east><west>{:.6}</west>",
        bbox.east(),
        bbox.west()
    )
}
