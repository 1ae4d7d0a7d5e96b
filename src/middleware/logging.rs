//! Request logging middleware, adapted from the teacher's
//! `middleware/logging.rs::request_logging_simple` (this crate runs
//! single-tenant/local, so there's no client address worth tracking).

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{info, warn};

/// Logs every HTTP request with method, path, status, and latency.
/// INFO for success, WARN for 5xx. Skips `/health` to cut keep-alive noise.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if path == "/health" {
        return next.run(request).await;
    }

    let start = Instant::now();
    let response = next.run(request).await;
    let latency = start.elapsed();
    let status = response.status().as_u16();

    if status >= 500 {
        warn!(
            method = %method,
            path = %path,
            status,
            latency_ms = latency.as_millis(),
            "request failed (5xx)"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status,
            latency_ms = latency.as_millis(),
            "request completed"
        );
    }

    response
}
