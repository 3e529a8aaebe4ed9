//! Prometheus /metrics endpoint

use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};

/// Prometheus text exposition endpoint.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.prometheus.as_ref() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "Metrics not enabled".to_string()),
    }
}
