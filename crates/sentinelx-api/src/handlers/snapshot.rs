//! Snapshot file serving.

use std::io::ErrorKind;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Serve a saved snapshot from the snapshot directory.
pub async fn get_snapshot(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    let path = state
        .snapshots
        .resolve(&filename)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ApiError::not_found("Snapshot not found"));
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read snapshot");
            return Err(ApiError::internal(format!("failed to read snapshot: {e}")));
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}
