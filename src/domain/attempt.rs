//! Resend attempt history domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Client-supplied reason for requesting a resend
///
/// Closed enum at the boundary: unknown strings fold into `Other` instead
/// of being stored verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResendReason {
    #[default]
    NotReceived,
    Expired,
    SpamFolder,
    #[serde(other)]
    Other,
}

impl ResendReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReceived => "not_received",
            Self::Expired => "expired",
            Self::SpamFolder => "spam_folder",
            Self::Other => "other",
        }
    }
}

/// Outcome recorded for an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Admitted,
    Rejected,
}

/// One entry in an identifier's attempt history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptEntry {
    pub timestamp: DateTime<Utc>,
    pub reason: ResendReason,
    pub outcome: AttemptOutcome,
}

/// Per-identifier resend history
///
/// Only admitted evaluations append to `attempts`; cooldown and lockout
/// rejections leave the history untouched. `locked_until`, when set and in
/// the future, rejects every request regardless of cooldown state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub identifier: String,
    pub attempts: Vec<AttemptEntry>,
    pub locked_until: Option<DateTime<Utc>>,
    /// Consecutive rejections since the last admission; not part of the
    /// attempt count, only feeds abuse auditing
    #[serde(default)]
    pub rejection_streak: u32,
    /// Last mutation, drives retention expiry
    pub updated_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn new(identifier: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            attempts: Vec::new(),
            locked_until: None,
            rejection_streak: 0,
            updated_at: now,
        }
    }

    /// Number of admitted attempts on record
    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    /// Timestamp of the most recent admitted attempt
    pub fn last_attempt_at(&self) -> Option<DateTime<Utc>> {
        self.attempts.last().map(|a| a.timestamp)
    }

    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.map(|until| now < until).unwrap_or(false)
    }

    /// Append an admitted attempt
    pub fn record_admission(&mut self, now: DateTime<Utc>, reason: ResendReason) {
        self.attempts.push(AttemptEntry {
            timestamp: now,
            reason,
            outcome: AttemptOutcome::Admitted,
        });
        self.rejection_streak = 0;
        self.updated_at = now;
    }

    /// Note a rejected evaluation without touching the attempt list
    pub fn record_rejection(&mut self, now: DateTime<Utc>) -> u32 {
        self.rejection_streak += 1;
        self.updated_at = now;
        self.rejection_streak
    }

    /// Set or extend the lockout window
    pub fn lock(&mut self, now: DateTime<Utc>, until: DateTime<Utc>) {
        match self.locked_until {
            Some(existing) if existing >= until => {}
            _ => self.locked_until = Some(until),
        }
        self.updated_at = now;
    }

    /// Whether the record has seen no activity since `cutoff`
    pub fn expired(&self, cutoff: DateTime<Utc>) -> bool {
        self.updated_at < cutoff && !self.is_locked(cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_reason_unknown_folds_to_other() {
        let reason: ResendReason = serde_json::from_str("\"whatever\"").unwrap();
        assert_eq!(reason, ResendReason::Other);
    }

    #[test]
    fn test_reason_known_values() {
        let reason: ResendReason = serde_json::from_str("\"spam_folder\"").unwrap();
        assert_eq!(reason, ResendReason::SpamFolder);
        assert_eq!(reason.as_str(), "spam_folder");
    }

    #[test]
    fn test_new_record_is_empty_and_unlocked() {
        let record = AttemptRecord::new("a@example.com", t0());
        assert_eq!(record.attempt_count(), 0);
        assert!(record.last_attempt_at().is_none());
        assert!(!record.is_locked(t0()));
    }

    #[test]
    fn test_record_admission_appends_and_touches() {
        let mut record = AttemptRecord::new("a@example.com", t0());
        record.record_admission(t0(), ResendReason::NotReceived);
        record.record_admission(t0() + Duration::seconds(90), ResendReason::Expired);

        assert_eq!(record.attempt_count(), 2);
        assert_eq!(
            record.last_attempt_at().unwrap(),
            t0() + Duration::seconds(90)
        );
        assert_eq!(record.updated_at, t0() + Duration::seconds(90));
        assert!(record
            .attempts
            .iter()
            .all(|a| a.outcome == AttemptOutcome::Admitted));
    }

    #[test]
    fn test_lock_never_shortens_window() {
        let mut record = AttemptRecord::new("a@example.com", t0());
        let far = t0() + Duration::hours(24);
        record.lock(t0(), far);
        record.lock(t0(), t0() + Duration::hours(1));
        assert_eq!(record.locked_until, Some(far));
    }

    #[test]
    fn test_is_locked_expires() {
        let mut record = AttemptRecord::new("a@example.com", t0());
        record.lock(t0(), t0() + Duration::hours(1));
        assert!(record.is_locked(t0() + Duration::minutes(59)));
        assert!(!record.is_locked(t0() + Duration::minutes(61)));
    }

    #[test]
    fn test_expired_respects_lockout() {
        let mut record = AttemptRecord::new("a@example.com", t0());
        record.record_admission(t0(), ResendReason::NotReceived);

        let cutoff = t0() + Duration::hours(2);
        assert!(record.expired(cutoff));

        // A still-active lockout pins the record even past retention
        record.lock(t0(), t0() + Duration::hours(48));
        assert!(!record.expired(cutoff));
    }

    #[test]
    fn test_record_serde_round_trip() {
        let mut record = AttemptRecord::new("a@example.com", t0());
        record.record_admission(t0(), ResendReason::SpamFolder);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: AttemptRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.identifier, "a@example.com");
        assert_eq!(parsed.attempt_count(), 1);
        assert_eq!(parsed.attempts[0].reason, ResendReason::SpamFolder);
    }
}
