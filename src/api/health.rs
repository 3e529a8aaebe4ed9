//! Health check endpoint

use axum::{response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "ops"
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        service: "mailgate",
        version: env!("CARGO_PKG_VERSION"),
    })
}
