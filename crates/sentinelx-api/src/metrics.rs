//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the global Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "sentinelx_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "sentinelx_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "sentinelx_http_requests_in_flight";

    // Stream metrics
    pub const STREAM_CLIENTS_TOTAL: &str = "sentinelx_stream_clients_total";
    pub const STREAM_CLIENTS_ACTIVE: &str = "sentinelx_stream_clients_active";
    pub const STREAM_FRAMES_SKIPPED_TOTAL: &str = "sentinelx_stream_frames_skipped_total";
}

/// Path label for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

/// Record an HTTP request.
///
/// `path` should be a route template, never a raw URI, so label
/// cardinality stays bounded.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a stream client connecting.
pub fn record_stream_connected() {
    counter!(names::STREAM_CLIENTS_TOTAL).increment(1);
    gauge!(names::STREAM_CLIENTS_ACTIVE).increment(1.0);
}

/// Record a stream client going away.
pub fn record_stream_disconnected() {
    gauge!(names::STREAM_CLIENTS_ACTIVE).decrement(1.0);
}

/// Record frames a slow stream client missed.
pub fn record_stream_frames_skipped(count: u64) {
    counter!(names::STREAM_FRAMES_SKIPPED_TOTAL).increment(count);
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
