//! Live MJPEG stream, raw video file and player pages.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use futures_util::stream;
use sentinelx_detector::runner::JpegFrame;
use sentinelx_detector::PipelineHandle;
use sentinelx_media::{multipart_part, MJPEG_CONTENT_TYPE};
use tokio::sync::broadcast::{self, error::RecvError};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// How often an idle stream checks whether the pipeline is still alive.
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

const PLAYER_HTML: &str = r#"<html>
    <head><title>SentinelX Video Player</title></head>
    <body>
        <h3>SentinelX Video (Direct MP4)</h3>
        <video width="720" height="480" controls autoplay>
            <source src="/video_file" type="video/mp4">
            Your browser does not support the video tag.
        </video>
    </body>
</html>
"#;

const PLAYER_STREAM_HTML: &str = r#"<html>
    <head><title>SentinelX MJPEG Stream</title></head>
    <body>
        <h3>SentinelX MJPEG Stream (with Detection)</h3>
        <img src="/video" alt="video stream" width="720" height="480" />
    </body>
</html>
"#;

/// Per-client stream state; decrements the active-client gauge on drop.
struct StreamClient {
    frames: broadcast::Receiver<JpegFrame>,
    pipeline: PipelineHandle,
}

impl StreamClient {
    fn new(pipeline: &PipelineHandle) -> Self {
        metrics::record_stream_connected();
        Self {
            frames: pipeline.subscribe_frames(),
            pipeline: pipeline.clone(),
        }
    }

    /// Next multipart chunk, or `None` once the pipeline has stopped.
    async fn next_part(&mut self) -> Option<Bytes> {
        loop {
            match tokio::time::timeout(IDLE_CHECK_INTERVAL, self.frames.recv()).await {
                Ok(Ok(jpeg)) => return Some(Bytes::from(multipart_part(&jpeg))),
                Ok(Err(RecvError::Lagged(skipped))) => {
                    debug!(skipped, "Stream client lagging, skipping frames");
                    metrics::record_stream_frames_skipped(skipped);
                }
                Ok(Err(RecvError::Closed)) => return None,
                Err(_) if !self.pipeline.is_running() => return None,
                Err(_) => {}
            }
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        metrics::record_stream_disconnected();
    }
}

/// MJPEG stream of the frames the detection pipeline processes.
pub async fn video_feed(State(state): State<AppState>) -> ApiResult<Response> {
    let pipeline = state
        .pipeline
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("No video source is available on the server"))?;

    if !pipeline.is_running() {
        return Err(ApiError::unavailable("The video stream has ended"));
    }

    info!("Stream client connected");
    let client = StreamClient::new(pipeline);
    let parts = stream::unfold(client, |mut client| async move {
        let part = client.next_part().await?;
        Some((Ok::<_, Infallible>(part), client))
    });

    Response::builder()
        .header(header::CONTENT_TYPE, MJPEG_CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache, no-store")
        .body(Body::from_stream(parts))
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// The configured video file, without detection.
pub async fn video_file(State(state): State<AppState>, request: Request) -> ApiResult<Response> {
    let path = &state.config.video_path;
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        _ => {
            return Err(ApiError::not_found(format!(
                "Video file not found: {}",
                path.display()
            )));
        }
    }

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .map_err(|e: Infallible| ApiError::internal(e.to_string()))?;
    Ok(response.into_response())
}

pub async fn player() -> Html<&'static str> {
    Html(PLAYER_HTML)
}

pub async fn player_stream() -> Html<&'static str> {
    Html(PLAYER_STREAM_HTML)
}
