//! Resend endpoint handler

use crate::api::SuccessResponse;
use crate::domain::ResendReason;
use crate::error::{AppError, Result};
use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for the resend endpoint
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResendRequest {
    pub email: String,
    #[serde(default)]
    pub reason: ResendReason,
}

/// Success payload for the resend endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendData {
    pub cooldown_seconds: u64,
    pub attempt_number: u32,
    pub retries_remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_spam_folder: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_available: Option<bool>,
}

/// Request a verification email resend.
///
/// Responds 200 for every syntactically valid address, registered or not;
/// rejections are 400 (validation), 429 (cooldown/lockout) or 503 (queue
/// at capacity). The submitted value is never reflected back.
#[utoipa::path(
    post,
    path = "/api/v1/auth/resend",
    request_body = ResendRequest,
    responses(
        (status = 200, description = "Resend admitted", body = SuccessResponse<ResendData>),
        (status = 400, description = "Invalid request"),
        (status = 429, description = "Rate limited or locked out"),
        (status = 503, description = "Delivery queue at capacity"),
    ),
    tag = "auth"
)]
pub async fn resend(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ResendRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    // Malformed JSON and wrong field types land here; same generic message
    // for all of them
    let Json(request) = payload.map_err(|_| AppError::Validation("Invalid request body"))?;

    let outcome = state
        .resend_service
        .resend_verification(&request.email, request.reason)
        .await?;

    let data = ResendData {
        cooldown_seconds: outcome.cooldown_seconds,
        attempt_number: outcome.attempt_number,
        retries_remaining: outcome.retries_remaining,
        check_spam_folder: outcome.check_spam_folder.then_some(true),
        support_available: outcome.support_available.then_some(true),
    };

    Ok(Json(SuccessResponse::new(
        "If this address is registered, a verification email is on its way.",
        data,
    )))
}
