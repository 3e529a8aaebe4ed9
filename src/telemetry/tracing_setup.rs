//! OpenTelemetry span export
//!
//! The OTLP layer is optional: it is only built when tracing is switched on
//! and an endpoint is configured, and a failure to construct the exporter
//! degrades to local-only logging rather than aborting startup.

use crate::config::TelemetryConfig;
use opentelemetry::trace::TracerProvider;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use tracing_opentelemetry::OpenTelemetryLayer;

/// Build the OTLP tracing layer, or `None` when disabled or misconfigured.
pub fn create_otel_layer<S>(
    config: &TelemetryConfig,
) -> Option<OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>>
where
    S: tracing::Subscriber + for<'span> tracing_subscriber::registry::LookupSpan<'span>,
{
    if !config.tracing_enabled {
        return None;
    }

    let Some(endpoint) = config.otlp_endpoint.clone() else {
        eprintln!(
            "WARN: OTEL_TRACING_ENABLED=true but OTEL_EXPORTER_OTLP_ENDPOINT not set, skipping"
        );
        return None;
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|err| eprintln!("ERROR: Failed to create OTLP exporter: {}", err))
        .ok()?;

    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder()
                .with_attributes(vec![KeyValue::new(
                    "service.name",
                    config.service_name.clone(),
                )])
                .build(),
        )
        .build();

    let tracer = provider.tracer(config.service_name.clone());

    // The global provider is what shutdown hooks flush
    opentelemetry::global::set_tracer_provider(provider);

    Some(tracing_opentelemetry::layer().with_tracer(tracer))
}
