//! HTTP middleware for Mailgate
//!
//! - Security headers middleware
//! - HTTP observability (request IDs + metrics)

pub mod metrics;
pub mod security_headers;

pub use metrics::ObservabilityLayer;
pub use security_headers::security_headers_middleware;
