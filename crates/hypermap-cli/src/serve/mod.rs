//! HAL hypermedia server for the demo geospatial catalog.
//!
//! Every route under the configured area answers in plain JSON by default
//! and in `application/hal+json` or `application/hal+xml` when the client
//! asks for it through `Accept` or the `f` query flag.
//!
//! # Module Structure
//!
//! - `catalog` - In-memory domain graph and its schemas
//! - `handlers` - HTTP route handlers
//! - `middleware` - HAL enrichment layer
//! - `models` - API request/response types (DTOs)

pub mod catalog;
mod handlers;
mod middleware;
mod models;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use hypermap_core::{Config, HalPipeline};

use catalog::Catalog;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState {
    /// Domain data served by the API.
    pub catalog: Catalog,
    /// HAL pipeline for the configured area.
    pub pipeline: Arc<HalPipeline>,
    /// Absolute base of request URIs, used for collection `self` links.
    pub base_url: String,
}

impl AppState {
    /// Build state from configuration, filling in resource names for
    /// catalog types the configuration does not map.
    pub fn new(mut config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        for (type_name, controller) in catalog::CONTROLLERS {
            config
                .controllers
                .entry(type_name.to_string())
                .or_insert_with(|| controller.to_string());
        }

        let registry = Arc::new(catalog::schemas()?);
        let pipeline = HalPipeline::from_config(&config, registry)?;

        Ok(Self {
            catalog: Catalog::demo(),
            pipeline: Arc::new(pipeline),
            base_url: config.hal.base_url,
        })
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the catalog server.
pub struct ServeConfig {
    /// Port to listen on.
    pub port: u16,
    /// HAL and routing settings.
    pub config: Config,
}

// =============================================================================
// Router
// =============================================================================

/// All API routes, wrapped in the HAL enrichment layer.
pub fn router(state: Arc<AppState>) -> Router {
    let area = state.pipeline.area().to_string();
    let api = Router::new()
        .route("/maps", get(handlers::list_maps))
        .route("/maps/{id}", get(handlers::get_map))
        .route("/layers", get(handlers::list_layers))
        .route("/layers/{id}", get(handlers::get_layer))
        .route("/spatialreferences", get(handlers::list_spatial_references))
        .route(
            "/spatialreferences/{wkid}",
            get(handlers::get_spatial_reference),
        );

    Router::new()
        .route("/", get(handlers::index))
        .nest(&format!("/{}", area), api)
        .layer(from_fn_with_state(state.clone(), middleware::hal_enrichment))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

// =============================================================================
// Server Entry Point
// =============================================================================

/// Start the catalog server.
pub async fn start_server(config: ServeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(config.config)?);
    let app = router(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    tracing::info!(%addr, area = state.pipeline.area(), "starting hypermap server");

    println!("Hypermap server listening on http://localhost:{}", config.port);
    println!("Links are built against {}", state.base_url);
    println!("Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
