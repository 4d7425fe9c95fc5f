//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::api_health))
        .route("/api/annotate", post(handlers::api_annotate))
        .route("/api/export/:format", post(handlers::api_export))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
