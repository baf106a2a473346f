//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use djrank_common::api::HealthResponse;

use crate::AppState;

/// GET /health
///
/// Does not require the admin token.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "djrank-server".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.gateway.backend_name().to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
