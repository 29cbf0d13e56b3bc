//! Per-request logging with request-id propagation.
//!
//! One middleware owns the whole request-scoped concern: ensure an
//! `x-request-id` exists (reusing the caller's when present), run the
//! request inside a span carrying it, stamp it on the response, and log a
//! completion event. When the dispatcher matched a gateway route, the
//! completion event also names the repository and git operation it
//! resolved (see [`RouteInfo`]).

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::dispatch::RouteInfo;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Logs one started/completed event pair per request.
pub async fn request_log_middleware(mut request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();

    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    );

    async move {
        info!("Request started");

        let mut response = next.run(request).await;

        let status = response.status().as_u16();
        let duration_ms = start.elapsed().as_millis() as u64;
        match response.extensions().get::<RouteInfo>() {
            Some(route) => info!(
                status,
                duration_ms,
                repo = %route.repo,
                operation = route.operation.unwrap_or("-"),
                "Request completed"
            ),
            None => info!(status, duration_ms, "Request completed"),
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), value);
        }

        response
    }
    .instrument(span)
    .await
}

// Behavior is covered in tests/middleware_test.rs through the full router.
