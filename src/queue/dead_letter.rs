//! Dead letter sink
//!
//! Terminal storage for jobs that exhausted their delivery retries. Kept
//! for operator inspection only; nothing here is ever retried.

use crate::domain::{DeadLetter, QueuedJob};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Mutex;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    async fn record(&self, job: &QueuedJob, error: &str);
    async fn list(&self) -> Vec<DeadLetter>;
    async fn count(&self) -> usize;
}

/// Bounded in-memory dead letter buffer; oldest entries roll off first
pub struct InMemoryDeadLetterSink {
    entries: Mutex<VecDeque<DeadLetter>>,
    capacity: usize,
}

impl InMemoryDeadLetterSink {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetterSink {
    async fn record(&self, job: &QueuedJob, error: &str) {
        let entry = DeadLetter {
            job_id: job.id.clone(),
            kind: job.kind,
            recipient: job.recipient.clone(),
            error: error.to_string(),
            attempts: job.attempts,
            created_at: job.created_at,
            failed_at: Utc::now(),
        };

        let mut entries = self.entries.lock().unwrap();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    async fn list(&self) -> Vec<DeadLetter> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    async fn count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
