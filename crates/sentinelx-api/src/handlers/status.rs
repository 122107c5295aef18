//! Root and status handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sentinelx_models::DetectorStatus;

use crate::state::AppState;

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("SentinelX backend is running"))
}

/// Live detector status.
pub async fn status(State(state): State<AppState>) -> Json<DetectorStatus> {
    Json(state.detector_status())
}
