//! Delivery queue job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Kind of account-notification email a job delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    Verification,
    PasswordReset,
    Welcome,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::PasswordReset => "password-reset",
            Self::Welcome => "welcome",
        }
    }
}

/// Queue ordering priority; lower rank drains first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobPriority {
    High,
    #[default]
    Normal,
    Low,
}

impl JobPriority {
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 1,
            Self::Normal => 5,
            Self::Low => 10,
        }
    }
}

/// Retry delay growth mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffMode {
    Fixed,
    Exponential,
}

/// Per-job retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub mode: BackoffMode,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            mode: BackoffMode::Exponential,
            base_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, given how many attempts have run
    pub fn delay_after(&self, attempts: u32) -> Duration {
        match self.mode {
            BackoffMode::Fixed => self.base_delay,
            BackoffMode::Exponential => {
                let shift = attempts.saturating_sub(1).min(16);
                self.base_delay.saturating_mul(1u32 << shift)
            }
        }
    }
}

/// Job lifecycle state
///
/// Strictly `pending -> processing -> (completed | pending | failed)`;
/// completed and failed jobs leave the live queue immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A delivery request handed to the queue
#[derive(Debug, Clone)]
pub struct EmailJob {
    pub kind: JobKind,
    pub recipient: String,
    /// Opaque template data; the renderer reads the keys it knows
    pub payload: serde_json::Value,
    pub priority: JobPriority,
    pub retry: RetryPolicy,
}

impl EmailJob {
    pub fn new(kind: JobKind, recipient: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind,
            recipient: recipient.into(),
            payload,
            priority: JobPriority::Normal,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_priority(mut self, priority: JobPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// A job owned by the queue
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: String,
    pub kind: JobKind,
    pub recipient: String,
    pub payload: serde_json::Value,
    pub priority: JobPriority,
    pub attempts: u32,
    pub retry: RetryPolicy,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
}

impl QueuedJob {
    pub fn from_request(id: String, job: EmailJob, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: job.kind,
            recipient: job.recipient,
            payload: job.payload,
            priority: job.priority,
            attempts: 0,
            retry: job.retry,
            status: JobStatus::Pending,
            created_at,
        }
    }
}

/// Terminally failed job retained for operator inspection
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub job_id: String,
    pub kind: JobKind,
    pub recipient: String,
    pub error: String,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub failed_at: DateTime<Utc>,
}
