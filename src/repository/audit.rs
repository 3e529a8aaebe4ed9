//! Audit sink port
//!
//! Consumed by the gate and queue for operator-facing security events.
//! Persistence of the audit trail lives outside this service; the default
//! sink emits structured tracing events and a counter.

use async_trait::async_trait;
use metrics::counter;
use serde::Serialize;

/// Severity classification for audit events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

impl AuditSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log(&self, event: &str, severity: AuditSeverity, details: serde_json::Value);
}

/// Audit sink that writes structured tracing events
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn log(&self, event: &str, severity: AuditSeverity, details: serde_json::Value) {
        counter!(
            "mailgate_audit_events_total",
            "event" => event.to_string(),
            "severity" => severity.as_str()
        )
        .increment(1);

        match severity {
            AuditSeverity::Info => {
                tracing::info!(event = %event, details = %details, "audit");
            }
            AuditSeverity::Warning => {
                tracing::warn!(event = %event, details = %details, "audit");
            }
            AuditSeverity::Critical => {
                tracing::error!(event = %event, details = %details, "audit");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_strings() {
        assert_eq!(AuditSeverity::Info.as_str(), "info");
        assert_eq!(AuditSeverity::Warning.as_str(), "warning");
        assert_eq!(AuditSeverity::Critical.as_str(), "critical");
    }

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        let sink = TracingAuditSink;
        sink.log(
            "resend.lockout",
            AuditSeverity::Warning,
            serde_json::json!({"identifier": "a@example.com"}),
        )
        .await;
    }

    #[tokio::test]
    async fn test_mock_sink_records_calls() {
        let mut mock = MockAuditSink::new();
        mock.expect_log()
            .withf(|event, severity, _| event == "resend.lockout" && *severity == AuditSeverity::Warning)
            .times(1)
            .returning(|_, _, _| ());

        mock.log(
            "resend.lockout",
            AuditSeverity::Warning,
            serde_json::json!({}),
        )
        .await;
    }
}
