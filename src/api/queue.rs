//! Operator endpoints for the delivery queue

use crate::api::SuccessResponse;
use crate::domain::DeadLetter;
use crate::queue::QueueStats;
use crate::server::AppState;
use axum::{extract::State, response::IntoResponse, Json};

/// Queue depth snapshot
#[utoipa::path(
    get,
    path = "/api/v1/queue/stats",
    responses((status = 200, description = "Current queue state", body = SuccessResponse<QueueStats>)),
    tag = "ops"
)]
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.queue.stats().await;
    Json(SuccessResponse::new("Queue statistics", stats))
}

/// Terminally failed jobs retained for inspection
#[utoipa::path(
    get,
    path = "/api/v1/queue/dead-letters",
    responses((status = 200, description = "Dead-lettered jobs", body = SuccessResponse<Vec<DeadLetter>>)),
    tag = "ops"
)]
pub async fn dead_letters(State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.queue.dead_letter_sink().list().await;
    Json(SuccessResponse::new("Dead-lettered jobs", entries))
}
