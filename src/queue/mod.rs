//! Asynchronous email delivery queue
//!
//! Priority-ordered in-process queue with a single background worker.
//! Admission (enqueue) and delivery are fully decoupled: callers get a job
//! id back immediately and never observe transport errors. Failed sends
//! retry with per-job backoff; jobs that exhaust their budget drain to the
//! dead letter sink.

pub mod dead_letter;

pub use dead_letter::{DeadLetterSink, InMemoryDeadLetterSink};

use crate::config::QueueConfig;
use crate::domain::{EmailJob, JobStatus, QueuedJob};
use crate::email::{templates, EmailProvider};
use crate::error::{AppError, Result};
use crate::repository::{AuditSeverity, AuditSink};
use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior};
use utoipa::ToSchema;
use uuid::Uuid;

/// Snapshot of queue state for the operator endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub total: usize,
    pub capacity: usize,
    pub dead_letters: usize,
}

/// A live job plus its scheduling state
struct Scheduled {
    job: QueuedJob,
    ready_at: Instant,
}

/// Priority delivery queue and its worker
pub struct DeliveryQueue {
    config: QueueConfig,
    jobs: Mutex<Vec<Scheduled>>,
    notify: Arc<Notify>,
    provider: Arc<dyn EmailProvider>,
    dead_letters: Arc<dyn DeadLetterSink>,
    audit: Arc<dyn AuditSink>,
}

impl DeliveryQueue {
    pub fn new(
        config: QueueConfig,
        provider: Arc<dyn EmailProvider>,
        dead_letters: Arc<dyn DeadLetterSink>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            jobs: Mutex::new(Vec::new()),
            notify: Arc::new(Notify::new()),
            provider,
            dead_letters,
            audit,
        }
    }

    /// Insert a job preserving priority order and wake the worker.
    ///
    /// Insertion is stable: among equal priorities, earlier enqueues drain
    /// first. Returns the generated job id, or `QueueFull` at capacity.
    pub fn enqueue(&self, job: EmailJob) -> Result<String> {
        let mut jobs = self.jobs.lock().unwrap();
        if jobs.len() >= self.config.capacity {
            counter!("mailgate_email_queue_overflow_total").increment(1);
            tracing::warn!(capacity = self.config.capacity, "delivery queue at capacity");
            return Err(AppError::QueueFull);
        }

        let id = format!("job_{}", Uuid::new_v4().simple());
        let mut queued = QueuedJob::from_request(id.clone(), job, Utc::now());
        if queued.retry.max_attempts == 0 {
            queued.retry.max_attempts = 1;
        }

        counter!(
            "mailgate_email_queue_added_total",
            "kind" => queued.kind.as_str(),
        )
        .increment(1);
        tracing::debug!(
            job_id = %id,
            kind = queued.kind.as_str(),
            priority = ?queued.priority,
            "email job enqueued"
        );

        let rank = queued.priority.rank();
        let position = jobs
            .iter()
            .position(|s| s.job.priority.rank() > rank)
            .unwrap_or(jobs.len());
        jobs.insert(
            position,
            Scheduled {
                job: queued,
                ready_at: Instant::now(),
            },
        );
        drop(jobs);

        self.notify.notify_one();
        Ok(id)
    }

    /// Background worker loop.
    ///
    /// Drains ready jobs one at a time, then parks until an enqueue/retry
    /// wake-up or the periodic tick, whichever comes first. The tick is the
    /// safety net for retry-ready jobs whose wake-up was lost.
    pub async fn run_worker(self: Arc<Self>) {
        let mut tick = tokio::time::interval(self.config.tick());
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            while self.process_next().await {}

            tokio::select! {
                _ = self.notify.notified() => {}
                _ = tick.tick() => {}
            }
        }
    }

    /// Process at most one ready pending job.
    ///
    /// Returns `true` if a job was processed (regardless of outcome), so
    /// the worker can keep draining. A job marked `processing` is invisible
    /// to further picks until its attempt resolves.
    pub async fn process_next(&self) -> bool {
        let picked = {
            let mut jobs = self.jobs.lock().unwrap();
            let now = Instant::now();
            let Some(scheduled) = jobs
                .iter_mut()
                .find(|s| s.job.status == JobStatus::Pending && s.ready_at <= now)
            else {
                return false;
            };

            scheduled.job.status = JobStatus::Processing;
            scheduled.job.attempts += 1;
            scheduled.job.clone()
        };

        tracing::debug!(
            job_id = %picked.id,
            kind = picked.kind.as_str(),
            attempt = picked.attempts,
            "delivery attempt"
        );

        let message = templates::render(&picked);
        let outcome = match self.provider.send(&message).await {
            Ok(result) if result.success => Ok(()),
            Ok(result) => Err(result
                .error
                .unwrap_or_else(|| "transport reported failure".to_string())),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(()) => self.complete(&picked.id).await,
            Err(error) => self.handle_failure(picked, error).await,
        }

        true
    }

    /// Current queue state
    pub async fn stats(&self) -> QueueStats {
        let (pending, processing, total) = {
            let jobs = self.jobs.lock().unwrap();
            let pending = jobs
                .iter()
                .filter(|s| s.job.status == JobStatus::Pending)
                .count();
            let processing = jobs
                .iter()
                .filter(|s| s.job.status == JobStatus::Processing)
                .count();
            (pending, processing, jobs.len())
        };

        QueueStats {
            pending,
            processing,
            total,
            capacity: self.config.capacity,
            dead_letters: self.dead_letters.count().await,
        }
    }

    pub fn dead_letter_sink(&self) -> Arc<dyn DeadLetterSink> {
        self.dead_letters.clone()
    }

    async fn complete(&self, job_id: &str) {
        let removed = self.remove(job_id);
        if let Some(mut scheduled) = removed {
            scheduled.job.status = JobStatus::Completed;
            counter!(
                "mailgate_email_delivered_total",
                "kind" => scheduled.job.kind.as_str(),
            )
            .increment(1);
            tracing::info!(job_id = %scheduled.job.id, "email delivered");
        }
    }

    async fn handle_failure(&self, picked: QueuedJob, error: String) {
        if picked.attempts >= picked.retry.max_attempts {
            if let Some(mut scheduled) = self.remove(&picked.id) {
                scheduled.job.status = JobStatus::Failed;
                counter!(
                    "mailgate_email_failed_total",
                    "kind" => scheduled.job.kind.as_str(),
                )
                .increment(1);
                tracing::error!(
                    job_id = %scheduled.job.id,
                    attempts = scheduled.job.attempts,
                    error = %error,
                    "email delivery failed, dead-lettering"
                );

                self.dead_letters.record(&scheduled.job, &error).await;
                self.audit
                    .log(
                        "delivery.dead_letter",
                        AuditSeverity::Critical,
                        serde_json::json!({
                            "job_id": scheduled.job.id,
                            "kind": scheduled.job.kind.as_str(),
                            "attempts": scheduled.job.attempts,
                            "error": error,
                        }),
                    )
                    .await;
            }
            return;
        }

        let delay = picked.retry.delay_after(picked.attempts);
        let ready_at = Instant::now() + delay;
        {
            let mut jobs = self.jobs.lock().unwrap();
            if let Some(scheduled) = jobs.iter_mut().find(|s| s.job.id == picked.id) {
                scheduled.job.status = JobStatus::Pending;
                scheduled.job.attempts = picked.attempts;
                scheduled.ready_at = ready_at;
            }
        }

        counter!(
            "mailgate_email_retry_total",
            "kind" => picked.kind.as_str(),
        )
        .increment(1);
        tracing::warn!(
            job_id = %picked.id,
            attempt = picked.attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "email delivery failed, retrying"
        );

        // Wake the worker when the retry becomes ready instead of waiting
        // for the next tick
        let notify = self.notify.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(ready_at).await;
            notify.notify_one();
        });
    }

    fn remove(&self, job_id: &str) -> Option<Scheduled> {
        let mut jobs = self.jobs.lock().unwrap();
        let index = jobs.iter().position(|s| s.job.id == job_id)?;
        Some(jobs.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        BackoffMode, EmailAddress, EmailMessage, EmailSendResult, JobKind, JobPriority,
        RetryPolicy,
    };
    use crate::email::provider::EmailProviderError;
    use crate::repository::audit::MockAuditSink;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Records recipients in delivery order; fails the first `failures`
    /// sends to each recipient.
    struct StubProvider {
        sent: Mutex<Vec<String>>,
        failures: AtomicU32,
    }

    impl StubProvider {
        fn reliable() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failures: AtomicU32::new(0),
            }
        }

        fn failing_first(n: u32) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                failures: AtomicU32::new(n),
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailProvider for StubProvider {
        async fn send(
            &self,
            message: &EmailMessage,
        ) -> std::result::Result<EmailSendResult, EmailProviderError> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(EmailProviderError::SendFailed("simulated outage".to_string()));
            }
            self.sent.lock().unwrap().push(message.to.email.clone());
            Ok(EmailSendResult::success(None))
        }

        async fn test_connection(&self) -> std::result::Result<(), EmailProviderError> {
            Ok(())
        }

        fn provider_name(&self) -> &'static str {
            "stub"
        }
    }

    fn quiet_audit() -> Arc<MockAuditSink> {
        let mut audit = MockAuditSink::new();
        audit.expect_log().returning(|_, _, _| ());
        Arc::new(audit)
    }

    fn queue_with(provider: Arc<StubProvider>) -> DeliveryQueue {
        DeliveryQueue::new(
            QueueConfig::default(),
            provider,
            Arc::new(InMemoryDeadLetterSink::new(10)),
            quiet_audit(),
        )
    }

    fn job(recipient: &str, priority: JobPriority) -> EmailJob {
        EmailJob::new(
            JobKind::Verification,
            recipient,
            serde_json::json!({"userName": "Test"}),
        )
        .with_priority(priority)
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            mode: BackoffMode::Exponential,
            base_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_enqueue_returns_job_id() {
        let queue = queue_with(Arc::new(StubProvider::reliable()));
        let id = queue.enqueue(job("a@example.com", JobPriority::Normal)).unwrap();
        assert!(id.starts_with("job_"));
        assert_eq!(queue.stats().await.pending, 1);
    }

    #[tokio::test]
    async fn test_priority_order_high_normal_low() {
        let provider = Arc::new(StubProvider::reliable());
        let queue = queue_with(provider.clone());

        // Enqueued low, high, normal; must drain high, normal, low
        queue.enqueue(job("low@example.com", JobPriority::Low)).unwrap();
        queue.enqueue(job("high@example.com", JobPriority::High)).unwrap();
        queue.enqueue(job("normal@example.com", JobPriority::Normal)).unwrap();

        while queue.process_next().await {}

        assert_eq!(
            provider.sent(),
            vec!["high@example.com", "normal@example.com", "low@example.com"]
        );
        assert_eq!(queue.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_fifo_within_equal_priority() {
        let provider = Arc::new(StubProvider::reliable());
        let queue = queue_with(provider.clone());

        queue.enqueue(job("first@example.com", JobPriority::Normal)).unwrap();
        queue.enqueue(job("second@example.com", JobPriority::Normal)).unwrap();
        queue.enqueue(job("third@example.com", JobPriority::Normal)).unwrap();

        while queue.process_next().await {}

        assert_eq!(
            provider.sent(),
            vec![
                "first@example.com",
                "second@example.com",
                "third@example.com"
            ]
        );
    }

    #[tokio::test]
    async fn test_capacity_rejects_overflow() {
        let provider = Arc::new(StubProvider::reliable());
        let queue = DeliveryQueue::new(
            QueueConfig {
                capacity: 2,
                ..QueueConfig::default()
            },
            provider,
            Arc::new(InMemoryDeadLetterSink::new(10)),
            quiet_audit(),
        );

        queue.enqueue(job("a@example.com", JobPriority::Normal)).unwrap();
        queue.enqueue(job("b@example.com", JobPriority::Normal)).unwrap();
        let err = queue
            .enqueue(job("c@example.com", JobPriority::Normal))
            .unwrap_err();
        assert!(matches!(err, AppError::QueueFull));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_retries_after_backoff() {
        let provider = Arc::new(StubProvider::failing_first(1));
        let queue = queue_with(provider.clone());

        queue
            .enqueue(job("a@example.com", JobPriority::Normal).with_retry(fast_retry(3)))
            .unwrap();

        // First attempt fails; job goes back to pending with a delay
        assert!(queue.process_next().await);
        assert_eq!(queue.stats().await.pending, 1);

        // Not ready yet
        assert!(!queue.process_next().await);

        tokio::time::advance(Duration::from_millis(150)).await;
        assert!(queue.process_next().await);
        assert_eq!(provider.sent(), vec!["a@example.com"]);
        assert_eq!(queue.stats().await.total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_dead_letter_exactly_once() {
        let provider = Arc::new(StubProvider::failing_first(10));
        let dead_letters = Arc::new(InMemoryDeadLetterSink::new(10));
        let queue = DeliveryQueue::new(
            QueueConfig::default(),
            provider,
            dead_letters.clone(),
            quiet_audit(),
        );

        queue
            .enqueue(job("a@example.com", JobPriority::Normal).with_retry(fast_retry(3)))
            .unwrap();

        for _ in 0..3 {
            while queue.process_next().await {}
            tokio::time::advance(Duration::from_secs(1)).await;
        }

        // Removed from the live queue, exactly one dead letter
        assert_eq!(queue.stats().await.total, 0);
        let entries = dead_letters.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].attempts, 3);
        assert_eq!(entries[0].recipient, "a@example.com");

        // Nothing left to retry
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(!queue.process_next().await);
        assert_eq!(dead_letters.count().await, 1);
    }

    #[tokio::test]
    async fn test_dead_letter_fires_critical_audit() {
        let mut audit = MockAuditSink::new();
        audit
            .expect_log()
            .withf(|event, severity, _| {
                event == "delivery.dead_letter" && *severity == AuditSeverity::Critical
            })
            .times(1)
            .returning(|_, _, _| ());

        let queue = DeliveryQueue::new(
            QueueConfig::default(),
            Arc::new(StubProvider::failing_first(10)),
            Arc::new(InMemoryDeadLetterSink::new(10)),
            Arc::new(audit),
        );

        queue
            .enqueue(job("a@example.com", JobPriority::Normal).with_retry(fast_retry(1)))
            .unwrap();
        assert!(queue.process_next().await);
        assert_eq!(queue.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_processing_job_not_picked_twice() {
        // Mark a job processing by hand and verify the picker skips it
        let queue = queue_with(Arc::new(StubProvider::reliable()));
        queue.enqueue(job("a@example.com", JobPriority::Normal)).unwrap();

        {
            let mut jobs = queue.jobs.lock().unwrap();
            jobs[0].job.status = JobStatus::Processing;
        }
        assert!(!queue.process_next().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_drains_burst() {
        let provider = Arc::new(StubProvider::reliable());
        let queue = Arc::new(queue_with(provider.clone()));
        let worker = tokio::spawn(queue.clone().run_worker());

        for i in 0..5 {
            queue
                .enqueue(job(&format!("user{}@example.com", i), JobPriority::Normal))
                .unwrap();
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(provider.sent().len(), 5);
        assert_eq!(queue.stats().await.total, 0);

        worker.abort();
    }

    #[tokio::test]
    async fn test_stats_shape() {
        let queue = queue_with(Arc::new(StubProvider::reliable()));
        queue.enqueue(job("a@example.com", JobPriority::Normal)).unwrap();

        let stats = queue.stats().await;
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.processing, 0);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.capacity, 1000);
        assert_eq!(stats.dead_letters, 0);
    }
}
