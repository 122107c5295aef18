//! API routes.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    get_snapshot, health, list_alerts, player, player_stream, ready, reset_detection, root,
    status, video_feed, video_file,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let detection_routes = Router::new()
        .route("/", get(root))
        .route("/status", get(status))
        .route("/alerts", get(list_alerts))
        // GET kept for browser-driven demos
        .route("/reset", get(reset_detection).post(reset_detection))
        .route("/snapshot/:filename", get(get_snapshot));

    let stream_routes = Router::new()
        .route("/video", get(video_feed))
        .route("/video_file", get(video_file))
        .route("/player", get(player))
        .route("/player_stream", get(player_stream));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(detection_routes)
        .merge(stream_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
