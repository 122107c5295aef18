//! Application state.

use std::sync::Arc;

use sentinelx_detector::{AlertStore, DetectorConfig, PipelineHandle};
use sentinelx_media::FsSnapshotWriter;
use sentinelx_models::{DetectorPhase, DetectorStatus};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub detector: Arc<DetectorConfig>,
    pub alerts: AlertStore,
    /// Absent when no frame source could be opened
    pub pipeline: Option<PipelineHandle>,
    pub snapshots: Arc<FsSnapshotWriter>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        detector: DetectorConfig,
        alerts: AlertStore,
        pipeline: Option<PipelineHandle>,
        snapshots: Arc<FsSnapshotWriter>,
    ) -> Self {
        Self {
            config,
            detector: Arc::new(detector),
            alerts,
            pipeline,
            snapshots,
        }
    }

    /// Current detector status, or a stopped status without a pipeline.
    pub fn detector_status(&self) -> DetectorStatus {
        match &self.pipeline {
            Some(pipeline) => pipeline.status(),
            None => DetectorStatus {
                phase: DetectorPhase::Stopped,
                alert_count: self.alerts.len(),
                ..DetectorStatus::initial(self.detector.baseline_frame_count)
            },
        }
    }

    /// Reset detection and clear alerts; returns the number of alerts cleared.
    ///
    /// Without a pipeline nothing ever appends alerts, so there is nothing
    /// to clear.
    pub async fn reset(&self) -> usize {
        match &self.pipeline {
            Some(pipeline) => pipeline.reset().await,
            None => 0,
        }
    }
}
