//! Tile services - KML super-overlays and TMS over a tile cache.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_services::{
    config::{CheckConfig, Cli, Command, ServeConfig},
    create_router,
    model::Configuration,
    service::{Request, ServiceRegistry},
    source::{DirectoryTileSource, EmptyTileSource},
    RouterConfig, ServiceError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config),
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let tiles = match Configuration::load(&config.config) {
        Ok(tiles) => Arc::new(tiles),
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Configuration:");
    info!("  File: {}", config.config.display());
    info!("  Tilesets: {}", tiles.tilesets().count());
    info!("  Grids: {}", tiles.grids().len());
    match (tiles.online_resource(), config.base_url.as_deref()) {
        (Some(url), _) => info!("  Online resource: {} (from configuration)", url),
        (None, Some(url)) => info!("  Online resource: {}", url),
        (None, None) => info!("  Online resource: derived from request headers"),
    }

    let registry = ServiceRegistry::with_default_services();
    let router_config = build_router_config(&config);
    let addr = config.bind_address();

    let router = match config.tile_dir {
        Some(ref dir) => {
            info!("  Tile directory: {}", dir.display());
            create_router(
                registry,
                tiles,
                DirectoryTileSource::new(dir),
                router_config,
            )
        }
        None => {
            warn!("  Tile directory: none - tile requests will return 404");
            create_router(registry, tiles, EmptyTileSource, router_config)
        }
    };

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl http://{}/tms/1.0.0", addr);
    info!("    curl http://{}/kml/<tileset>/0/0/0.kml", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_services=debug,tower_http=debug"
    } else {
        "tile_services=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application ServeConfig.
fn build_router_config(config: &ServeConfig) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref base_url) = config.base_url {
        router_config = router_config.with_base_url(base_url);
    }

    router_config
}

// =============================================================================
// Check Command
// =============================================================================

fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    println!("Tile Services Configuration Check");
    println!("═════════════════════════════════");
    println!();

    if let Err(e) = config.validate() {
        println!("✗ {}", e);
        return ExitCode::FAILURE;
    }

    let tiles = match Configuration::load(&config.config) {
        Ok(tiles) => {
            println!("✓ Configuration: {}", config.config.display());
            tiles
        }
        Err(e) => {
            println!("✗ Configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!();
    println!("Grids:");
    println!("──────");
    for grid in tiles.grids() {
        println!(
            "  {} ({}, {} levels, {}x{} tiles)",
            grid.name(),
            grid.srs(),
            grid.nlevels(),
            grid.tile_size().0,
            grid.tile_size().1
        );
    }

    println!();
    println!("Tilesets:");
    println!("─────────");
    let mut tileset_count = 0;
    for tileset in tiles.tilesets() {
        tileset_count += 1;
        let grids: Vec<&str> = tileset
            .grid_links()
            .iter()
            .map(|link| link.grid().name())
            .collect();
        println!(
            "  {} [{}] grids: {}",
            tileset.name(),
            tileset.extension(),
            grids.join(", ")
        );
    }
    if tileset_count == 0 {
        println!("  (no tilesets configured)");
    }

    if let Some(ref path) = config.kml {
        println!();
        print!("Rendering /kml/{}... ", path.trim_start_matches('/'));

        let registry = ServiceRegistry::with_default_services();
        let path = format!("/{}", path.trim_start_matches('/'));
        let document = registry
            .dispatch("kml", &path, &Default::default(), &tiles)
            .and_then(|(service, request)| match request {
                Request::GetCapabilities(request) => {
                    service.create_capabilities_response(&request, &config.base_url, &tiles)
                }
                Request::GetTile(_) => Err(ServiceError::UnsupportedRequest {
                    service: service.service_type().name(),
                }),
            });

        match document {
            Ok(capabilities) => {
                println!("✓ success");
                println!();
                print!("{}", capabilities.body);
            }
            Err(e) => {
                println!("✗ failed");
                println!("  {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!();
    println!("═════════════════════════════════");
    println!("✓ All checks passed!");

    ExitCode::SUCCESS
}
