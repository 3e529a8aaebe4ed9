//! Resend admission gate
//!
//! Orchestrates validation, attempt-store lookup, backoff policy, and the
//! admit/reject decision. Whether an identifier maps to a real account is
//! irrelevant here: every syntactically valid identifier takes the same
//! path, which keeps response shape and timing uniform.

pub mod backoff;
pub mod validate;

use crate::clock::Clock;
use crate::config::GateConfig;
use crate::domain::{AttemptRecord, ResendReason};
use crate::error::{AppError, Result};
use crate::repository::{AttemptStore, AuditSeverity, AuditSink};
use backoff::Decision;
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Consecutive rejections for one identifier before an audit event fires
const REJECTION_AUDIT_THRESHOLD: u32 = 3;

/// Successful admission returned to the service layer
#[derive(Debug, Clone)]
pub struct Admission {
    pub identifier: String,
    pub reason: ResendReason,
    pub attempt_number: u32,
    pub retries_remaining: u32,
    /// Cooldown in force until the next attempt may be admitted
    pub cooldown: Duration,
}

/// Stateful admission gate, keyed per normalized identifier
pub struct ResendGate {
    config: GateConfig,
    store: Arc<dyn AttemptStore>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
    /// Serializes the read-decide-append sequence per identifier
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ResendGate {
    pub fn new(
        config: GateConfig,
        store: Arc<dyn AttemptStore>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            store,
            clock,
            audit,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Evaluate a resend request.
    ///
    /// Validation rejections never touch the store. For valid identifiers
    /// the get -> decide -> mutate -> upsert sequence runs under a
    /// per-identifier lock, so two concurrent requests cannot both observe
    /// the same attempt number.
    pub async fn evaluate(&self, raw_identifier: &str, reason: ResendReason) -> Result<Admission> {
        let identifier = match validate::validate_identifier(raw_identifier) {
            Ok(id) => id,
            Err(e) => {
                counter!("mailgate_resend_evaluations_total", "result" => "validation_error")
                    .increment(1);
                return Err(e);
            }
        };

        let lock = self.lock_for(&identifier);
        let _guard = lock.lock().await;

        let now = self.clock.now();
        let existing = self.store.get(&identifier).await?;
        let decision = backoff::evaluate(&self.config, existing.as_ref(), now);

        let mut record =
            existing.unwrap_or_else(|| AttemptRecord::new(identifier.clone(), now));

        match decision {
            Decision::Admit {
                attempt_number,
                retries_remaining,
                next_cooldown,
            } => {
                record.record_admission(now, reason);
                self.store.upsert(&record).await?;

                counter!("mailgate_resend_evaluations_total", "result" => "admitted")
                    .increment(1);
                tracing::debug!(
                    identifier = %identifier,
                    attempt = attempt_number,
                    "resend admitted"
                );

                Ok(Admission {
                    identifier,
                    reason,
                    attempt_number,
                    retries_remaining,
                    cooldown: next_cooldown
                        .to_std()
                        .unwrap_or(Duration::ZERO),
                })
            }
            Decision::RateLimited {
                cooldown_remaining,
                next_retry_at,
            } => {
                let streak = record.record_rejection(now);
                self.store.upsert(&record).await?;
                self.audit_repeated_rejection(&record, streak).await;

                counter!("mailgate_resend_evaluations_total", "result" => "rate_limited")
                    .increment(1);

                Err(AppError::RateLimited {
                    cooldown_seconds: seconds_ceil(cooldown_remaining),
                    next_retry_at,
                })
            }
            Decision::LockedOut { locked_until } => {
                // Every evaluation landing here refreshes the lockout window
                let window_end =
                    now + chrono::Duration::seconds(self.config.lockout_secs as i64);
                record.lock(now, locked_until.max(window_end));
                let streak = record.record_rejection(now);
                let effective_until = record.locked_until.unwrap_or(window_end);
                self.store.upsert(&record).await?;

                self.audit
                    .log(
                        "resend.lockout",
                        AuditSeverity::Warning,
                        serde_json::json!({
                            "identifier": record.identifier,
                            "attempts": record.attempt_count(),
                            "locked_until": effective_until.to_rfc3339(),
                        }),
                    )
                    .await;
                self.audit_repeated_rejection(&record, streak).await;

                counter!("mailgate_resend_evaluations_total", "result" => "locked_out")
                    .increment(1);

                Err(AppError::MaxAttemptsExceeded {
                    cooldown_seconds: seconds_ceil(effective_until - now),
                    next_retry_at: effective_until,
                })
            }
        }
    }

    /// Drop lock entries no longer held by any in-flight evaluation.
    /// Called from the periodic sweep alongside store expiry.
    pub fn prune_locks(&self) {
        let mut locks = self.locks.lock().unwrap();
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    fn lock_for(&self, identifier: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(identifier.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    async fn audit_repeated_rejection(&self, record: &AttemptRecord, streak: u32) {
        if streak >= REJECTION_AUDIT_THRESHOLD {
            self.audit
                .log(
                    "resend.repeated_rejection",
                    AuditSeverity::Warning,
                    serde_json::json!({
                        "identifier": record.identifier,
                        "consecutive_rejections": streak,
                    }),
                )
                .await;
        }
    }
}

fn seconds_ceil(duration: chrono::Duration) -> u64 {
    let millis = duration.num_milliseconds().max(0);
    (millis as u64).div_ceil(1000)
}
