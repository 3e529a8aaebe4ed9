//! OpenAPI 3.0 documentation assembly
//!
//! Aggregates handler path annotations and schemas into a single document,
//! served as plain JSON.

use crate::api::health::HealthResponse;
use crate::api::resend::{ResendData, ResendRequest};
use crate::api::SuccessResponse;
use crate::domain::{DeadLetter, JobKind, JobPriority, JobStatus, ResendReason};
use crate::queue::QueueStats;
use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mailgate API",
        description = "Abuse-resistant resend gate and email delivery queue",
        version = env!("CARGO_PKG_VERSION"),
    ),
    paths(
        crate::api::resend::resend,
        crate::api::health::health,
        crate::api::queue::stats,
        crate::api::queue::dead_letters,
    ),
    components(schemas(
        ResendRequest,
        ResendData,
        ResendReason,
        SuccessResponse<ResendData>,
        SuccessResponse<QueueStats>,
        HealthResponse,
        QueueStats,
        DeadLetter,
        JobKind,
        JobPriority,
        JobStatus,
    )),
    tags(
        (name = "auth", description = "Account notification resend"),
        (name = "ops", description = "Operator visibility"),
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn serve() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_includes_resend_path() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/auth/resend"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
