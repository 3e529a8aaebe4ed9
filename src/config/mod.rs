//! Configuration management for Mailgate

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Resend gate configuration
    pub gate: GateConfig,
    /// Delivery queue configuration
    pub queue: QueueConfig,
    /// Attempt store backend configuration
    pub attempt_store: AttemptStoreConfig,
    /// Email provider configuration
    pub email: EmailConfig,
    /// Telemetry configuration
    pub telemetry: TelemetryConfig,
}

/// Resend gate backoff and lockout settings
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Base cooldown after the first admitted attempt
    pub base_cooldown_secs: u64,
    /// Ceiling for the doubling cooldown
    pub max_cooldown_secs: u64,
    /// Admitted attempts allowed before lockout
    pub max_attempts: u32,
    /// Lockout window applied when max attempts is exhausted
    pub lockout_secs: u64,
    /// Inactivity window after which an identifier's history expires
    pub retention_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            base_cooldown_secs: 60,
            max_cooldown_secs: 3600,
            max_attempts: 5,
            lockout_secs: 86400,
            retention_secs: 86400,
        }
    }
}

impl GateConfig {
    pub fn base_cooldown(&self) -> Duration {
        Duration::from_secs(self.base_cooldown_secs)
    }

    pub fn max_cooldown(&self) -> Duration {
        Duration::from_secs(self.max_cooldown_secs)
    }

    pub fn lockout_window(&self) -> Duration {
        Duration::from_secs(self.lockout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// Delivery queue settings
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of live jobs; enqueue is rejected beyond this
    pub capacity: usize,
    /// Periodic tick that picks up retry-ready jobs
    pub tick_secs: u64,
    /// Delivery attempts per job before dead-lettering
    pub max_attempts: u32,
    /// Base delay for delivery retry backoff
    pub retry_base_delay_ms: u64,
    /// Dead letter buffer size
    pub dead_letter_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            tick_secs: 5,
            max_attempts: 3,
            retry_base_delay_ms: 5000,
            dead_letter_capacity: 100,
        }
    }
}

impl QueueConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

/// Attempt store backend selection
#[derive(Debug, Clone)]
pub enum AttemptStoreConfig {
    /// Process-local map; single instance deployments and tests
    InMemory,
    /// Shared Redis backend for multi-instance deployments
    Redis { url: String },
}

/// Email provider selection
#[derive(Debug, Clone)]
pub enum EmailConfig {
    /// SMTP relay (also used by tests against a local sink)
    Smtp(SmtpSettings),
    /// AWS SES v2
    Ses(SesSettings),
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub use_tls: bool,
    pub from_email: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SesSettings {
    pub region: String,
    pub from_email: String,
    pub from_name: Option<String>,
}

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name reported to the tracing backend
    pub service_name: String,
    /// "json" or "text"
    pub log_format: String,
    /// Expose the Prometheus /metrics endpoint
    pub metrics_enabled: bool,
    /// Export spans over OTLP
    pub tracing_enabled: bool,
    /// OTLP collector endpoint
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "mailgate".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: true,
            tracing_enabled: false,
            otlp_endpoint: None,
        }
    }
}

/// Base URL used to build verification / reset links in outgoing mail
pub fn public_base_url() -> String {
    env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            gate: GateConfig {
                base_cooldown_secs: env_u64("GATE_BASE_COOLDOWN_SECS", 60),
                max_cooldown_secs: env_u64("GATE_MAX_COOLDOWN_SECS", 3600),
                max_attempts: env_u64("GATE_MAX_ATTEMPTS", 5) as u32,
                lockout_secs: env_u64("GATE_LOCKOUT_SECS", 86400),
                retention_secs: env_u64("GATE_RETENTION_SECS", 86400),
            },
            queue: QueueConfig {
                capacity: env_u64("QUEUE_CAPACITY", 1000) as usize,
                tick_secs: env_u64("QUEUE_TICK_SECS", 5),
                max_attempts: env_u64("QUEUE_MAX_ATTEMPTS", 3) as u32,
                retry_base_delay_ms: env_u64("QUEUE_RETRY_BASE_DELAY_MS", 5000),
                dead_letter_capacity: env_u64("QUEUE_DEAD_LETTER_CAPACITY", 100) as usize,
            },
            attempt_store: match env::var("REDIS_URL") {
                Ok(url) if !url.trim().is_empty() => AttemptStoreConfig::Redis { url },
                _ => AttemptStoreConfig::InMemory,
            },
            email: Self::email_from_env()?,
            telemetry: TelemetryConfig {
                service_name: env::var("OTEL_SERVICE_NAME")
                    .unwrap_or_else(|_| "mailgate".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
                metrics_enabled: env_bool("METRICS_ENABLED", true),
                tracing_enabled: env_bool("OTEL_TRACING_ENABLED", false),
                otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            },
        })
    }

    fn email_from_env() -> Result<EmailConfig> {
        let provider = env::var("EMAIL_PROVIDER").unwrap_or_else(|_| "smtp".to_string());
        match provider.as_str() {
            "ses" => Ok(EmailConfig::Ses(SesSettings {
                region: env::var("SES_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                from_email: env::var("EMAIL_FROM").context("EMAIL_FROM is required")?,
                from_name: env::var("EMAIL_FROM_NAME").ok(),
            })),
            "smtp" => Ok(EmailConfig::Smtp(SmtpSettings {
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .context("Invalid SMTP_PORT")?,
                username: env::var("SMTP_USERNAME").ok(),
                password: env::var("SMTP_PASSWORD").ok(),
                use_tls: env_bool("SMTP_USE_TLS", true),
                from_email: env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "no-reply@localhost".to_string()),
                from_name: env::var("EMAIL_FROM_NAME").ok(),
            })),
            other => anyhow::bail!("Unknown EMAIL_PROVIDER: {}", other),
        }
    }

    /// HTTP bind address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}
