//! Common test utilities
//!
//! Builds a fully wired application against in-memory collaborators: no
//! network, no Redis, no real SMTP. The clock is a handle the tests can
//! advance to step through cooldown windows.

// Each test binary uses its own subset of these helpers
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use mailgate::clock::FixedClock;
use mailgate::config::{
    AttemptStoreConfig, Config, EmailConfig, GateConfig, QueueConfig, SmtpSettings,
    TelemetryConfig,
};
use mailgate::domain::{EmailMessage, EmailSendResult};
use mailgate::email::{EmailProvider, EmailProviderError};
use mailgate::repository::InMemoryAttemptStore;
use mailgate::server::{build_router, build_state, AppState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Email transport stub: records sends, optionally fails everything.
pub struct RecordingProvider {
    pub sent: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl RecordingProvider {
    pub fn reliable() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(true),
        })
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl EmailProvider for RecordingProvider {
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailProviderError::SendFailed("simulated outage".to_string()));
        }
        self.sent.lock().unwrap().push(message.to.email.clone());
        Ok(EmailSendResult::success(None))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A wired application plus handles the tests poke at
pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<FixedClock>,
    pub provider: Arc<RecordingProvider>,
}

pub fn t0() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-06-01T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn test_config() -> Config {
    Config {
        http_host: "127.0.0.1".to_string(),
        http_port: 0,
        gate: GateConfig::default(),
        queue: QueueConfig::default(),
        attempt_store: AttemptStoreConfig::InMemory,
        email: EmailConfig::Smtp(SmtpSettings {
            host: "localhost".to_string(),
            port: 1025,
            username: None,
            password: None,
            use_tls: false,
            from_email: "no-reply@example.com".to_string(),
            from_name: None,
        }),
        telemetry: TelemetryConfig {
            metrics_enabled: false,
            ..TelemetryConfig::default()
        },
    }
}

pub fn spawn_app(provider: Arc<RecordingProvider>) -> TestApp {
    let clock = Arc::new(FixedClock::new(t0()));
    let store = Arc::new(InMemoryAttemptStore::new(std::time::Duration::from_secs(
        86400,
    )));

    let state = build_state(test_config(), store, clock.clone(), provider.clone(), None);

    TestApp {
        state,
        clock,
        provider,
    }
}

impl TestApp {
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// POST /api/v1/auth/resend with a raw body
    pub async fn post_resend_raw(&self, body: &str) -> Response<Body> {
        self.router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/auth/resend")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// POST /api/v1/auth/resend for an email address
    pub async fn post_resend(&self, email: &str) -> Response<Body> {
        self.post_resend_raw(&serde_json::json!({ "email": email }).to_string())
            .await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.router()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Read a response body as JSON
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert status and return the parsed body
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default(),
        "application/json"
    );
    body_json(response).await
}
