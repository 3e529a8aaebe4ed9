//! Unified error handling for Mailgate

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
///
/// `RateLimited` and `MaxAttemptsExceeded` are the gate's structured
/// rejections; `SendFailed` is only ever handled inside the delivery queue
/// and never reaches an HTTP response (admission and delivery are
/// decoupled).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(&'static str),

    #[error("Rate limited: retry in {cooldown_seconds}s")]
    RateLimited {
        cooldown_seconds: u64,
        next_retry_at: DateTime<Utc>,
    },

    #[error("Max attempts exceeded: locked until {next_retry_at}")]
    MaxAttemptsExceeded {
        cooldown_seconds: u64,
        next_retry_at: DateTime<Utc>,
    },

    #[error("Delivery queue at capacity")]
    QueueFull,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Store error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response envelope: `{ success: false, error: { code, message, details? } }`
#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<RejectionDetails>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RejectionDetails {
    cooldown_seconds: u64,
    next_retry_at: String,
}

impl RejectionDetails {
    fn new(cooldown_seconds: u64, next_retry_at: DateTime<Utc>) -> Self {
        Self {
            cooldown_seconds,
            next_retry_at: next_retry_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                (*msg).to_string(),
                None,
            ),
            AppError::RateLimited {
                cooldown_seconds,
                next_retry_at,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Please wait {} seconds before retrying", cooldown_seconds),
                Some(RejectionDetails::new(*cooldown_seconds, *next_retry_at)),
            ),
            AppError::MaxAttemptsExceeded {
                cooldown_seconds,
                next_retry_at,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "MAX_ATTEMPTS_EXCEEDED",
                "Maximum resend attempts reached. Please contact support.".to_string(),
                Some(RejectionDetails::new(*cooldown_seconds, *next_retry_at)),
            ),
            AppError::QueueFull => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "The service is temporarily busy. Please try again later.".to_string(),
                None,
            ),
            AppError::SendFailed(e) => {
                tracing::error!("Send error surfaced to HTTP layer: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorEnvelope {
            success: false,
            error: ErrorBody {
                code,
                message,
                details,
            },
        });

        (status, body).into_response()
    }
}
