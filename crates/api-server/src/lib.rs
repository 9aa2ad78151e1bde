//! REST API server for the media analysis pipeline
//!
//! One operation: submit a video or image for analysis. The upload is
//! staged, analyzed by the media-understanding provider, enriched with
//! generated ad copy when possible, and returned as a typed JSON result.

mod handlers;
mod types;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use adlens_orchestrator::Pipeline;

pub use handlers::*;
pub use types::*;

/// API server state shared across handlers
#[derive(Clone)]
pub struct ApiState {
    /// Pipeline that processes uploads
    pub pipeline: Arc<Pipeline>,
}

impl ApiState {
    /// Create new API state around a pipeline
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Media analysis
        .route("/api/v1/analyze", post(analyze_media))
        // The upload-size ceiling is enforced by the fronting host, not here
        .layer(DefaultBodyLimit::disable())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server
///
/// # Errors
/// Returns an error if the listener cannot bind or the server fails.
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    tracing::info!("Starting API server on {}", addr);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await
}
