//! Command-line configuration for the tile services server.
//!
//! This module provides:
//! - Command-line arguments via clap
//! - Environment variables with `TILES_` prefix
//! - Sensible defaults for all optional settings
//!
//! Tilesets and grids are not configured here; they live in the YAML file
//! passed with `--config` (see [`crate::model::Configuration`]).
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use tile_services::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Check(config) => println!("Checking {}", config.config.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `TILES_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILES_PORT` - Server port (default: 3000)
//! - `TILES_CONFIG` - Path to the tileset configuration file
//! - `TILES_TILE_DIR` - Directory holding pre-rendered tiles
//! - `TILES_BASE_URL` - Externally visible base URL for generated links
//! - `TILES_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `TILES_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

pub use crate::server::handlers::DEFAULT_CACHE_MAX_AGE;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tile services - KML super-overlays and TMS over a tile cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-services")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeConfig),

    /// Validate a configuration file and optionally render one KML document
    Check(CheckConfig),
}

/// Options of the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILES_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILES_PORT")]
    pub port: u16,

    /// Externally visible base URL used in generated links.
    ///
    /// If not specified, it is derived from the Host and X-Forwarded-Proto
    /// request headers. A `url` entry in the configuration file wins over both.
    #[arg(long, env = "TILES_BASE_URL")]
    pub base_url: Option<String>,

    // =========================================================================
    // Tileset Configuration
    // =========================================================================
    /// Path to the YAML tileset configuration.
    #[arg(short, long, env = "TILES_CONFIG")]
    pub config: PathBuf,

    /// Directory holding pre-rendered tiles as
    /// `<tileset>/<grid>/<z>/<x>/<y>.<ext>`.
    ///
    /// Without it only capabilities documents are served.
    #[arg(long, env = "TILES_TILE_DIR")]
    pub tile_dir: Option<PathBuf>,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "TILES_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILES_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty".to_string());
        }

        if let Some(ref base_url) = self.base_url {
            validate_base_url(base_url)?;
        }

        if let Some(ref dir) = self.tile_dir {
            if !dir.is_dir() {
                return Err(format!(
                    "tile directory {} does not exist or is not a directory",
                    dir.display()
                ));
            }
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Options of the `check` command.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Path to the YAML tileset configuration.
    #[arg(short, long, env = "TILES_CONFIG")]
    pub config: PathBuf,

    /// Render the KML document for this path, e.g. `basetiles@WGS84/0/0/0.kml`.
    #[arg(long)]
    pub kml: Option<String>,

    /// Base URL used in rendered links.
    #[arg(long, default_value = "http://localhost:3000", env = "TILES_BASE_URL")]
    pub base_url: String,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        validate_base_url(&self.base_url)
    }
}

fn validate_base_url(base_url: &str) -> Result<(), String> {
    let url = url::Url::parse(base_url).map_err(|e| format!("invalid base URL {base_url}: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(format!(
            "base URL {base_url} must use http or https, not {scheme}"
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
