//! Storage and sink ports (Repository pattern)

pub mod attempt;
pub mod audit;

pub use attempt::{AttemptStore, InMemoryAttemptStore, RedisAttemptStore};
pub use audit::{AuditSeverity, AuditSink, TracingAuditSink};
