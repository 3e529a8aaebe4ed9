//! HTTP observability middleware
//!
//! Implemented as a Tower Layer/Service to avoid axum's `from_fn` layer
//! count limits. Combines request ID propagation and metrics recording.

use axum::{body::Body, http::Request, response::Response};
use metrics::{counter, gauge, histogram};
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Tower Layer for HTTP observability (request ID + metrics).
#[derive(Clone)]
pub struct ObservabilityLayer;

impl<S> Layer<S> for ObservabilityLayer {
    type Service = ObservabilityMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ObservabilityMiddleware { inner }
    }
}

/// Tower Service that records HTTP metrics and propagates request IDs.
#[derive(Clone)]
pub struct ObservabilityMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for ObservabilityMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let method = request.method().to_string();
        let path = request.uri().path().to_string();

        // Extract or generate request ID
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        gauge!("mailgate_http_requests_in_flight").increment(1.0);
        let start = Instant::now();

        let mut inner = self.inner.clone();
        let span = tracing::info_span!("request", request_id = %request_id);

        Box::pin(
            async move {
                let response = inner.call(request).await?;

                let duration = start.elapsed().as_secs_f64();
                let status = response.status().as_u16().to_string();

                counter!("mailgate_http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
                    .increment(1);
                histogram!("mailgate_http_request_duration_seconds", "method" => method, "path" => path)
                    .record(duration);
                gauge!("mailgate_http_requests_in_flight").decrement(1.0);

                // Echo request ID in response headers
                let mut response = response;
                if let Ok(value) = request_id.parse() {
                    response.headers_mut().insert("x-request-id", value);
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}
