//! Smoke event detection core.
//!
//! This crate provides:
//! - Baseline calibration over the first frames of a run
//! - Hysteresis event detection against the baseline
//! - Cooldown-gated alert creation with snapshot persistence
//! - Lifecycle control (stream restart, external reset)
//! - A paced pipeline runner with an async control handle

pub mod alert_gate;
pub mod alert_store;
pub mod calibrator;
pub mod clock;
pub mod config;
pub mod error;
pub mod event_detector;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod runner;

pub use alert_gate::AlertGate;
pub use alert_store::AlertStore;
pub use calibrator::BaselineCalibrator;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DetectorConfig, HysteresisThresholds};
pub use error::{DetectorError, DetectorResult};
pub use event_detector::{Classification, EventDetector, EventState, Transition};
pub use logging::DetectionLogger;
pub use pipeline::{DetectionPipeline, FrameOutcome};
pub use runner::{PipelineCommand, PipelineHandle, PipelineRunner, RunSummary};
