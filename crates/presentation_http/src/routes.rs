//! Route definitions

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

/// Create the main router with all routes.
pub fn create_router(state: AppState, cors_enabled: bool) -> Router {
    let router = Router::new()
        // Aggregate endpoint (path matches the upstream API casing)
        .route("/Aggregator", get(handlers::aggregator::get_aggregate))
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
