//! Route handler functions, grouped by resource.

pub mod auth;
pub mod categories;
pub mod chat;
pub mod tasks;

use axum::Json;
use serde::Serialize;

/// GET / - health check, public.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "Taskdeck API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
