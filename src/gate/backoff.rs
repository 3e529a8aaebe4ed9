//! Backoff and lockout policy
//!
//! Pure decision function: given an identifier's history and the current
//! time, decide whether a resend is admitted, cooling down, or locked out.
//! The gate applies the decision; nothing here touches storage.

use crate::config::GateConfig;
use crate::domain::AttemptRecord;
use chrono::{DateTime, Duration, Utc};

/// Outcome of a policy evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed as attempt `attempt_number`
    Admit {
        attempt_number: u32,
        retries_remaining: u32,
        /// Cooldown that will apply after this admission
        next_cooldown: Duration,
    },
    /// Inside the cooldown window of the previous admission
    RateLimited {
        cooldown_remaining: Duration,
        next_retry_at: DateTime<Utc>,
    },
    /// Attempt budget exhausted (or an earlier lockout still active)
    LockedOut { locked_until: DateTime<Utc> },
}

/// Cooldown in force after `admitted` attempts: `base * 2^(admitted-1)`,
/// capped at the configured ceiling.
pub fn cooldown_after(config: &GateConfig, admitted: u32) -> Duration {
    if admitted == 0 {
        return Duration::zero();
    }
    let shift = (admitted - 1).min(16);
    let uncapped = config.base_cooldown_secs.saturating_mul(1 << shift);
    Duration::seconds(uncapped.min(config.max_cooldown_secs) as i64)
}

/// Evaluate the policy for one identifier.
///
/// Lockout takes precedence over rate limiting: an identifier at or past
/// the attempt budget is locked out even when its cooldown has elapsed.
/// An identifier with no history is always admitted as attempt 1.
pub fn evaluate(config: &GateConfig, record: Option<&AttemptRecord>, now: DateTime<Utc>) -> Decision {
    let record = match record {
        Some(r) => r,
        None => return admit(config, 0),
    };

    if let Some(locked_until) = record.locked_until {
        if now < locked_until {
            return Decision::LockedOut { locked_until };
        }
    }

    let count = record.attempt_count();
    if count >= config.max_attempts {
        return Decision::LockedOut {
            locked_until: now + Duration::seconds(config.lockout_secs as i64),
        };
    }

    if let Some(last) = record.last_attempt_at() {
        let cooldown = cooldown_after(config, count);
        let next_retry_at = last + cooldown;
        if now < next_retry_at {
            return Decision::RateLimited {
                cooldown_remaining: next_retry_at - now,
                next_retry_at,
            };
        }
    }

    admit(config, count)
}

fn admit(config: &GateConfig, prior_attempts: u32) -> Decision {
    let attempt_number = prior_attempts + 1;
    Decision::Admit {
        attempt_number,
        retries_remaining: config.max_attempts.saturating_sub(attempt_number),
        next_cooldown: cooldown_after(config, attempt_number),
    }
}
