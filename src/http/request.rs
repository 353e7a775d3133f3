//! Per-request plumbing: request IDs, spans, in-flight tracking, panics.

use std::any::Any;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::Span;

use crate::lifecycle::{Shutdown, ShutdownReason};
use crate::net::InFlightTracker;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Span for one request, tagged with its ID (set by the outer request-id layer).
pub fn request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Middleware counting requests that are still being handled.
pub async fn track_in_flight(
    State(tracker): State<InFlightTracker>,
    request: Request,
    next: Next,
) -> Response {
    let _guard = tracker.track();
    next.run(request).await
}

/// Build the panic responder: answer 500 and escalate to shutdown.
pub fn panic_responder(
    shutdown: Shutdown,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |payload: Box<dyn Any + Send + 'static>| {
        let detail = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        tracing::error!(panic = %detail, "Request handler panicked");
        shutdown.trigger(ShutdownReason::Fault(detail));
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}
