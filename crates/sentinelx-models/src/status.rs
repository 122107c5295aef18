//! Live detector status published by the pipeline.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// System name reported by status endpoints.
pub const SYSTEM_NAME: &str = "SentinelX";

/// Which phase of a run the detector is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectorPhase {
    /// Collecting baseline samples
    #[default]
    Calibrating,
    /// Baseline established, classifying frames
    Monitoring,
    /// Frame source ended permanently
    Stopped,
}

impl DetectorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorPhase::Calibrating => "calibrating",
            DetectorPhase::Monitoring => "monitoring",
            DetectorPhase::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for DetectorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse risk level shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    #[default]
    Low,
    High,
}

/// Snapshot of the detection pipeline's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectorStatus {
    pub system: String,
    pub phase: DetectorPhase,
    /// Baseline intensity, once calibration has completed
    pub baseline: Option<f64>,
    /// Baseline samples collected in the current run
    pub samples_collected: usize,
    /// Samples required to complete calibration
    pub baseline_frames: usize,
    /// Whether a smoke event is currently open
    pub smoke_active: bool,
    /// Frames classified since calibration completed
    pub frames_since_calibration: u64,
    /// Highest intensity seen in the current run
    pub max_intensity_seen: f64,
    /// Stream loops observed since startup
    pub stream_restarts: u64,
    /// Alerts currently held in the store
    pub alert_count: usize,
    pub risk_level: RiskLevel,
    pub updated_at: DateTime<Utc>,
}

impl DetectorStatus {
    /// Status of a freshly started (or reset) pipeline.
    pub fn initial(baseline_frames: usize) -> Self {
        Self {
            system: SYSTEM_NAME.to_string(),
            phase: DetectorPhase::Calibrating,
            baseline: None,
            samples_collected: 0,
            baseline_frames,
            smoke_active: false,
            frames_since_calibration: 0,
            max_intensity_seen: 0.0,
            stream_restarts: 0,
            alert_count: 0,
            risk_level: RiskLevel::Low,
            updated_at: Utc::now(),
        }
    }

    /// Whether calibration has completed for the current run.
    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    /// Risk level implied by the smoke flag.
    pub fn risk_for(smoke_active: bool) -> RiskLevel {
        if smoke_active {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }
}
