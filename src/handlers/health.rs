//! Liveness and health endpoints

use axum::Json;

use crate::models::HealthResponse;

/// Plain-text liveness check
pub async fn root() -> &'static str {
    "Users gateway is running"
}

/// Health check endpoint. Does not reach the record store.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
