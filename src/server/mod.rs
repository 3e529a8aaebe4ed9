//! Server initialization and routing

use crate::api;
use crate::clock::{Clock, SystemClock};
use crate::config::{AttemptStoreConfig, Config};
use crate::email::{self, EmailProvider};
use crate::gate::ResendGate;
use crate::middleware::{security_headers_middleware, ObservabilityLayer};
use crate::openapi;
use crate::queue::{DeliveryQueue, InMemoryDeadLetterSink};
use crate::repository::{AttemptStore, InMemoryAttemptStore, RedisAttemptStore, TracingAuditSink};
use crate::service::ResendService;
use anyhow::Result;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Interval for the housekeeping sweep (store expiry, lock pruning, gauges)
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<ResendGate>,
    pub queue: Arc<DeliveryQueue>,
    pub resend_service: Arc<ResendService>,
    pub store: Arc<dyn AttemptStore>,
    pub clock: Arc<dyn Clock>,
    pub prometheus: Option<PrometheusHandle>,
}

/// Wire gate, queue and service from their collaborators.
///
/// Tests inject their own store/clock/provider here; `run` wires the
/// production implementations.
pub fn build_state(
    config: Config,
    store: Arc<dyn AttemptStore>,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn EmailProvider>,
    prometheus: Option<PrometheusHandle>,
) -> AppState {
    let audit = Arc::new(TracingAuditSink);

    let gate = Arc::new(ResendGate::new(
        config.gate.clone(),
        store.clone(),
        clock.clone(),
        audit.clone(),
    ));
    let queue = Arc::new(DeliveryQueue::new(
        config.queue.clone(),
        provider,
        Arc::new(InMemoryDeadLetterSink::new(config.queue.dead_letter_capacity)),
        audit,
    ));
    let resend_service = Arc::new(ResendService::new(
        gate.clone(),
        queue.clone(),
        &config.queue,
    ));

    AppState {
        config: Arc::new(config),
        gate,
        queue,
        resend_service,
        store,
        clock,
        prometheus,
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/metrics", get(api::metrics::metrics_handler))
        .route("/api/v1/auth/resend", post(api::resend::resend))
        .route("/api/v1/queue/stats", get(api::queue::stats))
        .route("/api/v1/queue/dead-letters", get(api::queue::dead_letters))
        .route("/api-docs/openapi.json", get(openapi::serve))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(ObservabilityLayer)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors)
        .with_state(state)
}

/// Spawn the delivery worker and the housekeeping sweep
pub fn spawn_background_tasks(state: &AppState) {
    tokio::spawn(state.queue.clone().run_worker());

    let sweep_state = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tick.tick().await;

            match sweep_state.store.sweep_expired(sweep_state.clock.now()).await {
                Ok(0) => {}
                Ok(removed) => {
                    counter!("mailgate_attempt_records_swept_total").increment(removed as u64);
                    tracing::debug!(removed, "swept expired attempt records");
                }
                Err(e) => tracing::warn!(error = %e, "attempt store sweep failed"),
            }

            sweep_state.gate.prune_locks();

            let stats = sweep_state.queue.stats().await;
            gauge!("mailgate_email_queue_depth").set(stats.total as f64);
            gauge!("mailgate_dead_letters").set(stats.dead_letters as f64);
        }
    });
}

/// Run the server until shutdown
pub async fn run(config: Config, prometheus: Option<PrometheusHandle>) -> Result<()> {
    let provider = email::build_provider(&config.email).await?;
    info!("Email provider: {}", provider.provider_name());

    let store: Arc<dyn AttemptStore> = match &config.attempt_store {
        AttemptStoreConfig::InMemory => {
            info!("Attempt store: in-memory");
            Arc::new(InMemoryAttemptStore::new(config.gate.retention()))
        }
        AttemptStoreConfig::Redis { url } => {
            info!("Attempt store: redis");
            Arc::new(RedisAttemptStore::connect(url, config.gate.retention()).await?)
        }
    };

    let addr = config.http_addr();
    let state = build_state(config, store, Arc::new(SystemClock), provider, prometheus);

    spawn_background_tasks(&state);

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, router).await?;
    Ok(())
}
