//! Resend service
//!
//! Glue between the admission gate and the delivery queue: an admitted
//! request becomes a verification job, and the caller gets back the gate's
//! decision enriched with UX hints. Delivery itself is fire-and-forget; the
//! caller never waits on (or learns about) transport outcomes.

use crate::config::{public_base_url, QueueConfig};
use crate::domain::{BackoffMode, EmailJob, JobKind, JobPriority, ResendReason, RetryPolicy};
use crate::error::Result;
use crate::gate::ResendGate;
use crate::queue::DeliveryQueue;
use metrics::counter;
use rand::Rng;
use std::sync::Arc;

/// Attempt number from which repeat requests jump the queue
const PRIORITY_ESCALATION_ATTEMPT: u32 = 4;

/// Outcome of an admitted resend request
#[derive(Debug, Clone)]
pub struct ResendOutcome {
    pub attempt_number: u32,
    pub retries_remaining: u32,
    /// Cooldown now in force, i.e. the wait before the next attempt
    pub cooldown_seconds: u64,
    pub check_spam_folder: bool,
    pub support_available: bool,
    pub job_id: String,
}

pub struct ResendService {
    gate: Arc<ResendGate>,
    queue: Arc<DeliveryQueue>,
    default_retry: RetryPolicy,
}

impl ResendService {
    pub fn new(gate: Arc<ResendGate>, queue: Arc<DeliveryQueue>, queue_config: &QueueConfig) -> Self {
        Self {
            gate,
            queue,
            default_retry: RetryPolicy {
                max_attempts: queue_config.max_attempts,
                mode: BackoffMode::Exponential,
                base_delay: queue_config.retry_base_delay(),
            },
        }
    }

    /// Handle a verification resend request.
    ///
    /// Gate rejections propagate as structured errors; on admission a
    /// delivery job is enqueued and only its id is retained. A full queue
    /// surfaces as `QueueFull` and the admission record keeps its new
    /// attempt entry.
    pub async fn resend_verification(
        &self,
        raw_email: &str,
        reason: ResendReason,
    ) -> Result<ResendOutcome> {
        let admission = self.gate.evaluate(raw_email, reason).await?;

        let token = generate_verification_token();
        let action_url = format!("{}/auth/verify?token={}", public_base_url(), token);
        let user_name = admission
            .identifier
            .split('@')
            .next()
            .unwrap_or("there")
            .to_string();

        let priority = if admission.attempt_number >= PRIORITY_ESCALATION_ATTEMPT {
            JobPriority::High
        } else {
            JobPriority::Normal
        };

        let job = EmailJob::new(
            JobKind::Verification,
            &admission.identifier,
            serde_json::json!({
                "userName": user_name,
                "actionUrl": action_url,
                "attemptNumber": admission.attempt_number,
                "expiresIn": "24 hours",
                "reason": admission.reason.as_str(),
            }),
        )
        .with_priority(priority)
        .with_retry(self.default_retry);

        let job_id = self.queue.enqueue(job)?;

        counter!("mailgate_resend_admitted_total", "reason" => reason.as_str()).increment(1);
        tracing::info!(
            identifier = %admission.identifier,
            attempt = admission.attempt_number,
            job_id = %job_id,
            "verification resend enqueued"
        );

        Ok(ResendOutcome {
            attempt_number: admission.attempt_number,
            retries_remaining: admission.retries_remaining,
            cooldown_seconds: admission.cooldown.as_secs(),
            check_spam_folder: admission.attempt_number > 1,
            support_available: admission.attempt_number >= 3,
            job_id,
        })
    }
}

/// Generate an opaque, URL-safe verification token
fn generate_verification_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
