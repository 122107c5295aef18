//! Alert history and reset handlers.

use axum::extract::State;
use axum::Json;
use sentinelx_models::Alert;
use tracing::info;

use crate::handlers::status::MessageResponse;
use crate::state::AppState;

/// All alerts, most recent first.
pub async fn list_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    Json(state.alerts.list_newest_first())
}

/// Reset detection and clear the alert history.
pub async fn reset_detection(State(state): State<AppState>) -> Json<MessageResponse> {
    let cleared = state.reset().await;
    info!(cleared, "Detection state and alerts cleared");
    Json(MessageResponse::new("Detection reset successfully"))
}
