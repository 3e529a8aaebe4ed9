//! Telemetry initialization: metrics, tracing, and structured logging

pub mod metrics;
pub mod tracing_setup;

use crate::config::TelemetryConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the full telemetry stack.
///
/// Returns `Some(PrometheusHandle)` when metrics are enabled so the HTTP
/// server can expose a `/metrics` endpoint.
pub fn init(config: &TelemetryConfig) -> Option<PrometheusHandle> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mailgate=info,tower_http=debug".into());

    let prometheus_handle = if config.metrics_enabled {
        let handle = metrics::install_prometheus_recorder();
        metrics::describe_metrics();
        Some(handle)
    } else {
        None
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    // The OpenTelemetry layer's `S` type parameter must match the composed
    // subscriber, so both shapes are built in full here.
    if config.log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().flatten_event(true);
        let otel_layer = tracing_setup::create_otel_layer(config);
        registry.with(fmt_layer).with(otel_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let otel_layer = tracing_setup::create_otel_layer(config);
        registry.with(fmt_layer).with(otel_layer).init();
    }

    prometheus_handle
}
