//! Security headers middleware
//!
//! Adds standard hardening headers to every response. The service also
//! deliberately sets no `Server` or other identity headers.

use axum::{body::Body, http::header, http::Request, middleware::Next, response::Response};

/// Security headers middleware function
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // Prevent MIME type sniffing
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, "nosniff".parse().unwrap());

    // Prevent clickjacking
    headers.insert(header::X_FRAME_OPTIONS, "DENY".parse().unwrap());

    // XSS protection (legacy but still useful for older browsers)
    headers.insert("X-XSS-Protection", "1; mode=block".parse().unwrap());

    // Control referrer information
    headers.insert(
        header::REFERRER_POLICY,
        "strict-origin-when-cross-origin".parse().unwrap(),
    );

    // Prevent caching of API responses
    headers.insert(
        header::CACHE_CONTROL,
        "no-store, no-cache, must-revalidate, private".parse().unwrap(),
    );

    response
}
