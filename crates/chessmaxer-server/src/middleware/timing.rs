//! Request timing middleware.
//!
//! Engine searches dominate response time, so every request is logged with
//! its duration and the ones that waited on a long search stand out.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Requests slower than this are logged as warnings.
pub const SLOW_REQUEST_MS: u128 = 1000;

/// Middleware that logs method, path, status and duration of each request.
///
/// A slow request usually means a deep search, or a queue behind one: each
/// engine session serves one request at a time.
pub async fn timing_layer(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    if duration_ms > SLOW_REQUEST_MS {
        tracing::warn!(
            method = %method,
            path = %uri,
            status = status,
            duration_ms = duration_ms,
            "Slow request"
        );
    } else {
        tracing::debug!(
            method = %method,
            path = %uri,
            status = status,
            duration_ms = duration_ms,
            "Request completed"
        );
    }

    response
}
