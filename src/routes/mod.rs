//! Application routes configuration
use crate::handlers::{get_flights, get_nearby_aircraft, health, AppState};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Flight history (summary or raw)
        .route("/flights/:hex", get(get_flights))
        // Aircraft inside a bounding box
        .route("/aircraft/nearby", get(get_nearby_aircraft))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
