//! HTTP server layer for the tile services.
//!
//! This module exposes the protocol services over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │          GET /{service}/{*path}        GET /health              │
//! │                                                                 │
//! │  ┌──────────────────────────────┐  ┌─────────────────────────┐  │
//! │  │          handlers            │  │        routes           │  │
//! │  │ (dispatch, errors, headers)  │  │ (router config, CORS)   │  │
//! │  └──────────────┬───────────────┘  └─────────────────────────┘  │
//! └─────────────────┼───────────────────────────────────────────────┘
//!                   ▼
//!         ServiceRegistry ──► KML / TMS ──► TileSource
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    health_handler, request_base_url, service_handler, service_root_handler, AppState,
    ErrorResponse, HandlerError, HealthResponse,
};
pub use routes::{create_router, RouterConfig};
