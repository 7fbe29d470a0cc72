//! TMS 1.0.0 service.
//!
//! | Path after `/tms`                        | Request                         |
//! |------------------------------------------|---------------------------------|
//! | `/` or `/1.0.0`                          | TileMapService root document    |
//! | `/1.0.0/<layer>[@<grid>]`                | TileMap document for one layer  |
//! | `/1.0.0/<layer>[@<grid>]/<z>/<x>/<y>.<ext>` | Tile image                   |
//!
//! Tile rows count upwards from the bottom of the grid, the same convention
//! the grid model uses, so no row flipping happens here.

use std::fmt;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::model::{Configuration, GridLink, Tileset};

use super::path::{parse_tile_path, resolve_layer, segments, ExtensionRule};
use super::{
    online_resource, tileset_online_resource, xml_escape, Capabilities, CapabilitiesRequest,
    Params, Request, Service, ServiceType, TileRequest,
};

/// The only TMS version served.
pub const TMS_VERSION: &str = "1.0.0";

/// MIME type of TMS capabilities documents.
pub const TMS_MIME_TYPE: &str = "text/xml";

/// Tile Map Service protocol.
#[derive(Debug, Clone)]
pub struct TmsService {
    url_prefix: String,
}

impl Default for TmsService {
    fn default() -> Self {
        Self::new()
    }
}

impl TmsService {
    pub fn new() -> Self {
        Self {
            url_prefix: "tms".to_string(),
        }
    }
}

impl Service for TmsService {
    fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    fn service_type(&self) -> ServiceType {
        ServiceType::Tms
    }

    fn parse_request(
        &self,
        path: &str,
        _params: &Params,
        config: &Configuration,
    ) -> Result<Request, ServiceError> {
        let service = ServiceType::Tms.name();
        let parts: Vec<&str> = segments(path).collect();

        let Some((version, rest)) = parts.split_first() else {
            return Ok(Request::GetCapabilities(CapabilitiesRequest::TmsService));
        };
        if *version != TMS_VERSION {
            return Err(ServiceError::InvalidVersion {
                service,
                path: path.to_string(),
                version: version.to_string(),
            });
        }

        match rest {
            [] => Ok(Request::GetCapabilities(CapabilitiesRequest::TmsService)),
            [layer] => {
                let (tileset, grid_link) = resolve_layer(service, path, layer, config)?;
                Ok(Request::GetCapabilities(CapabilitiesRequest::TmsTileMap {
                    tileset,
                    grid_link,
                }))
            }
            _ => {
                let tile = parse_tile_path(
                    service,
                    path,
                    rest.iter().copied(),
                    config,
                    ExtensionRule::TilesetFormat,
                )?
                .into_tile()?;
                Ok(Request::GetTile(TileRequest { tile }))
            }
        }
    }

    fn create_capabilities_response(
        &self,
        request: &CapabilitiesRequest,
        base_url: &str,
        config: &Configuration,
    ) -> Result<Capabilities, ServiceError> {
        let body = match request {
            CapabilitiesRequest::TmsService => TileMapServiceDocument { config, base_url }.to_string(),
            CapabilitiesRequest::TmsTileMap { tileset, grid_link } => TileMapDocument {
                tileset,
                grid_link,
                service_resource: &xml_escape(online_resource(config, base_url)),
                tileset_resource: &xml_escape(tileset_online_resource(tileset, config, base_url)),
            }
            .to_string(),
            CapabilitiesRequest::Kml { .. } => {
                return Err(ServiceError::UnsupportedRequest {
                    service: ServiceType::Tms.name(),
                })
            }
        };

        Ok(Capabilities {
            mime_type: TMS_MIME_TYPE,
            body,
        })
    }
}

// =============================================================================
// Documents
// =============================================================================

/// Href of a tile map, with a trailing slash. `online_resource` is already escaped.
fn tile_map_href(online_resource: &str, tileset: &Tileset, grid_link: &GridLink) -> String {
    format!(
        "{}/tms/{}/{}@{}/",
        online_resource,
        TMS_VERSION,
        xml_escape(tileset.name()),
        xml_escape(grid_link.grid().name())
    )
}

struct TileMapServiceDocument<'a> {
    config: &'a Configuration,
    base_url: &'a str,
}

impl fmt::Display for TileMapServiceDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.config.metadata("title").unwrap_or("Tile Map Service");
        let abstract_ = self.config.metadata("abstract").unwrap_or("");

        writeln!(f, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(f, r#"<TileMapService version="{TMS_VERSION}">"#)?;
        writeln!(f, "  <Title>{}</Title>", xml_escape(title))?;
        writeln!(f, "  <Abstract>{}</Abstract>", xml_escape(abstract_))?;
        writeln!(f, "  <TileMaps>")?;
        for tileset in self.config.tilesets() {
            let resource = xml_escape(tileset_online_resource(tileset, self.config, self.base_url));
            for grid_link in tileset.grid_links() {
                let grid = grid_link.grid();
                writeln!(
                    f,
                    r#"    <TileMap title="{}" srs="{}" profile="{}" href="{}"/>"#,
                    xml_escape(tileset.title()),
                    xml_escape(grid.srs()),
                    grid.profile(),
                    tile_map_href(&resource, tileset, grid_link)
                )?;
            }
        }
        writeln!(f, "  </TileMaps>")?;
        writeln!(f, "</TileMapService>")
    }
}

struct TileMapDocument<'a> {
    tileset: &'a Arc<Tileset>,
    grid_link: &'a Arc<GridLink>,
    service_resource: &'a str,
    tileset_resource: &'a str,
}

impl fmt::Display for TileMapDocument<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.grid_link.grid();
        let extent = self.grid_link.extent();
        let origin = grid.extent();
        let (width, height) = grid.tile_size();
        let href = tile_map_href(self.tileset_resource, self.tileset, self.grid_link);

        writeln!(f, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            f,
            r#"<TileMap version="{}" tilemapservice="{}/tms/{}/">"#,
            TMS_VERSION, self.service_resource, TMS_VERSION
        )?;
        writeln!(f, "  <Title>{}</Title>", xml_escape(self.tileset.title()))?;
        writeln!(
            f,
            "  <Abstract>{}</Abstract>",
            xml_escape(self.tileset.metadata("abstract").unwrap_or(""))
        )?;
        writeln!(f, "  <SRS>{}</SRS>", xml_escape(grid.srs()))?;
        writeln!(
            f,
            r#"  <BoundingBox minx="{:.6}" miny="{:.6}" maxx="{:.6}" maxy="{:.6}"/>"#,
            extent.minx, extent.miny, extent.maxx, extent.maxy
        )?;
        writeln!(
            f,
            r#"  <Origin x="{:.6}" y="{:.6}"/>"#,
            origin.minx, origin.miny
        )?;
        writeln!(
            f,
            r#"  <TileFormat width="{}" height="{}" mime-type="{}" extension="{}"/>"#,
            width,
            height,
            xml_escape(self.tileset.mime_type()),
            xml_escape(self.tileset.extension())
        )?;
        writeln!(f, r#"  <TileSets profile="{}">"#, grid.profile())?;
        for (order, resolution) in grid.resolutions().iter().enumerate() {
            writeln!(
                f,
                r#"    <TileSet href="{href}{order}" units-per-pixel="{resolution:.20}" order="{order}"/>"#
            )?;
        }
        writeln!(f, "  </TileSets>")?;
        writeln!(f, "</TileMap>")
    }
}
