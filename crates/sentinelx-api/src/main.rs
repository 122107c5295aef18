//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentinelx_api::{create_router, metrics, ApiConfig, AppState};
use sentinelx_detector::{AlertStore, DetectionPipeline, DetectorConfig, PipelineRunner};
use sentinelx_media::{open_first_available, FsSnapshotWriter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    info!("Starting sentinelx-api");

    // Load configuration
    let config = ApiConfig::from_env();
    let detector_config = match DetectorConfig::from_env().and_then(|c| c.validate().map(|_| c)) {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid detector configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("API config: host={}, port={}", config.host, config.port);
    info!(
        baseline_frames = detector_config.baseline_frame_count,
        delta_threshold = detector_config.delta_threshold,
        return_threshold = detector_config.return_threshold,
        cooldown_secs = detector_config.cooldown.as_secs(),
        location = %detector_config.location,
        "Detector config loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        info!("Prometheus metrics enabled at /metrics");
        Some(metrics::init_metrics().context("failed to install Prometheus recorder")?)
    } else {
        None
    };

    let alerts = AlertStore::new();
    let snapshots = Arc::new(
        FsSnapshotWriter::new(&config.snapshot_dir).with_quality(detector_config.jpeg_quality),
    );

    // Start the detection pipeline if a frame source is available
    let (pipeline, worker) = match open_first_available(&config.video_candidates()) {
        Ok(source) => {
            let pipeline = DetectionPipeline::system(detector_config.clone(), alerts.clone())?;
            let (runner, handle) = PipelineRunner::new(pipeline, source, snapshots.clone());
            (Some(handle), Some(runner.spawn()))
        }
        Err(e) => {
            warn!(error = %e, "No frame source available, detection and /video disabled");
            (None, None)
        }
    };

    let state = AppState::new(
        config.clone(),
        detector_config,
        alerts,
        pipeline.clone(),
        snapshots,
    );

    // Create router
    let app = create_router(state, metrics_handle);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid bind address")?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    // Stopping the pipeline first lets open MJPEG streams finish
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            if let Some(handle) = pipeline {
                handle.shutdown();
            }
        })
        .await
        .context("server error")?;

    if let Some(worker) = worker {
        match worker.await {
            Ok(summary) => info!(
                frames = summary.frames,
                restarts = summary.stream_restarts,
                worst_cycle_ms = summary.worst_cycle.as_millis() as u64,
                "Detection pipeline stopped"
            ),
            Err(e) => warn!(error = %e, "Detection pipeline worker failed"),
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Colored output for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentinelx=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
