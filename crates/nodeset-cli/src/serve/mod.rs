//! Local HTTP server exposing search, rendering, catalog and ingestion.
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API request/response types (DTOs)
//! - `guides` - static reading guides

mod guides;
mod handlers;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use nodeset_core::NodeSetService;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState {
    /// Initialized service instance.
    pub service: Arc<NodeSetService>,
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the HTTP server.
pub struct ServeConfig {
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { port: 3333 }
    }
}

// =============================================================================
// Server Entry Point
// =============================================================================

/// Build the API router around an initialized service.
pub fn router(service: Arc<NodeSetService>) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/api/search", get(handlers::api_search))
        .route("/api/documents/{id}", get(handlers::api_document))
        .route("/api/catalog", get(handlers::api_catalog))
        .route("/api/ingest", post(handlers::api_ingest))
        .route("/api/guides", get(handlers::api_guides))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

/// Start the HTTP server and run until it fails.
pub async fn start_server(
    service: Arc<NodeSetService>,
    config: ServeConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(service);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    println!("Starting nodeset server...");
    println!("API: http://localhost:{}/api/search?q=", config.port);
    println!("Press Ctrl+C to stop\n");

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
