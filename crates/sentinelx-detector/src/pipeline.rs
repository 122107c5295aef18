//! Detection lifecycle.
//!
//! [`DetectionPipeline`] owns the calibrator, the event detector and the
//! alert gate, and decides what survives a stream loop or an external reset:
//!
//! | State                | Stream loop | External reset |
//! |----------------------|-------------|----------------|
//! | Baseline and samples | cleared     | cleared        |
//! | Event state          | idle        | idle           |
//! | Run diagnostics      | cleared     | cleared        |
//! | Alert history        | kept        | cleared        |
//! | Cooldown timestamp   | kept        | kept           |

use chrono::Utc;
use sentinelx_media::{mean_luminance, Frame, MediaResult, SnapshotWriter};
use sentinelx_models::{Alert, DetectorPhase, DetectorStatus};
use tracing::warn;

use crate::alert_gate::AlertGate;
use crate::alert_store::AlertStore;
use crate::calibrator::BaselineCalibrator;
use crate::clock::{Clock, SystemClock};
use crate::config::DetectorConfig;
use crate::error::DetectorResult;
use crate::event_detector::{Classification, EventDetector, EventState, Transition};
use crate::logging::DetectionLogger;
use crate::metrics;

/// What processing one frame produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Sample added to the calibration window
    Calibrating { collected: usize, target: usize },
    /// This sample completed calibration
    Calibrated { baseline: f64 },
    /// Frame classified without creating an alert
    Classified(Classification),
    /// An event started and an alert was created
    Alerted(Alert),
    /// An event started inside the cooldown window
    Suppressed(Classification),
    /// Intensity could not be measured; state unchanged
    Degraded,
}

impl FrameOutcome {
    pub fn alert(&self) -> Option<&Alert> {
        match self {
            FrameOutcome::Alerted(alert) => Some(alert),
            _ => None,
        }
    }
}

/// Per-process detection state machine.
pub struct DetectionPipeline<C: Clock = SystemClock> {
    config: DetectorConfig,
    calibrator: BaselineCalibrator,
    detector: EventDetector,
    gate: AlertGate,
    store: AlertStore,
    clock: C,
    logger: DetectionLogger,
    stream_restarts: u64,
    stopped: bool,
}

impl DetectionPipeline<SystemClock> {
    /// Pipeline driven by the wall clock.
    pub fn system(config: DetectorConfig, store: AlertStore) -> DetectorResult<Self> {
        Self::new(config, store, SystemClock)
    }
}

impl<C: Clock> DetectionPipeline<C> {
    /// Build a pipeline, rejecting invalid configuration.
    pub fn new(config: DetectorConfig, store: AlertStore, clock: C) -> DetectorResult<Self> {
        config.validate()?;
        let thresholds = config.thresholds()?;

        Ok(Self {
            calibrator: BaselineCalibrator::new(config.baseline_frame_count),
            detector: EventDetector::new(thresholds),
            gate: AlertGate::new(config.cooldown, config.location.clone()),
            logger: DetectionLogger::new(&config.location),
            config,
            store,
            clock,
            stream_restarts: 0,
            stopped: false,
        })
    }

    /// Measure a decoded frame and process it.
    ///
    /// Snapshots are written through `snapshots` only when an alert fires;
    /// a failed write yields an alert without a snapshot.
    pub fn process_frame(&mut self, frame: &Frame, snapshots: &dyn SnapshotWriter) -> FrameOutcome {
        let reading = mean_luminance(frame);
        if let Ok(intensity) = reading {
            self.logger.log_frame(frame.index(), intensity);
        }
        self.process_reading(reading, |name| persist_snapshot(snapshots, frame, name))
    }

    /// Process one intensity reading.
    pub fn process_reading<F>(&mut self, reading: MediaResult<f64>, persist: F) -> FrameOutcome
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let intensity = match reading {
            Ok(intensity) => intensity,
            Err(err) => {
                self.logger.log_extraction_failed(&err);
                metrics::record_extraction_failure();
                if self.calibrator.is_calibrated() {
                    self.detector.neutral();
                }
                return FrameOutcome::Degraded;
            }
        };

        self.detector.record_intensity(intensity);
        metrics::set_intensity(intensity, self.calibrator.baseline());

        let Some(baseline) = self.calibrator.baseline() else {
            return match self.calibrator.observe(intensity) {
                Some(baseline) => {
                    self.logger
                        .log_baseline(baseline, self.calibrator.samples_collected());
                    FrameOutcome::Calibrated { baseline }
                }
                None => FrameOutcome::Calibrating {
                    collected: self.calibrator.samples_collected(),
                    target: self.calibrator.target(),
                },
            };
        };

        let classification = self.detector.classify(intensity, baseline);
        self.log_monitor(intensity, baseline, classification.delta);

        match classification.transition {
            Transition::Started => self.on_event_started(intensity, classification, persist),
            Transition::Ended => {
                self.logger.log_event_ended(intensity, classification.delta);
                metrics::set_smoke_active(false);
                FrameOutcome::Classified(classification)
            }
            Transition::Sustained | Transition::Quiet => FrameOutcome::Classified(classification),
        }
    }

    fn on_event_started<F>(
        &mut self,
        intensity: f64,
        classification: Classification,
        persist: F,
    ) -> FrameOutcome
    where
        F: FnOnce(&str) -> Option<String>,
    {
        self.logger.log_event_started(intensity, classification.delta);
        metrics::record_event_started();
        metrics::set_smoke_active(true);

        let now = self.clock.now();
        match self.gate.try_fire(now, intensity, classification.delta, persist) {
            Some(alert) => {
                self.store.append(alert.clone());
                self.logger.log_alert(&alert);
                metrics::record_alert(true);
                FrameOutcome::Alerted(alert)
            }
            None => {
                self.logger
                    .log_alert_skipped(self.gate.cooldown_remaining(now));
                metrics::record_alert(false);
                FrameOutcome::Suppressed(classification)
            }
        }
    }

    fn log_monitor(&self, intensity: f64, baseline: f64, delta: f64) {
        let interval = self.config.monitor_log_interval;
        if interval > 0 && self.detector.frame_count() % interval == 0 {
            self.logger.log_monitor(
                intensity,
                baseline,
                delta,
                self.detector.max_intensity_seen(),
                self.detector.is_active(),
            );
        }
    }

    /// The frame source looped back to its first frame.
    ///
    /// Recalibrates from scratch. Alert history and cooldown are kept.
    pub fn on_stream_restart(&mut self) {
        self.logger
            .log_stream_restart(self.detector.max_intensity_seen());
        self.clear_run();
        self.stream_restarts += 1;
        metrics::record_stream_restart();
    }

    /// Operator-requested reset.
    ///
    /// Recalibrates and clears the alert history; returns the number of
    /// alerts removed. The cooldown timestamp is kept. Calling it twice in a
    /// row leaves the same state as calling it once.
    pub fn on_external_reset(&mut self) -> usize {
        self.clear_run();
        let cleared = self.store.clear();
        self.logger.log_reset(cleared);
        metrics::record_reset();
        cleared
    }

    /// Apply a reset whose alert history was already cleared by the caller.
    ///
    /// Recalibrates only. Alerts raised after the history was cleared stay.
    pub fn on_late_reset(&mut self) {
        self.clear_run();
        self.logger.log_late_reset();
    }

    fn clear_run(&mut self) {
        self.calibrator.reset();
        self.detector.reset();
        self.logger.next_run();
        metrics::set_smoke_active(false);
    }

    /// The frame source ended for good.
    pub fn mark_stopped(&mut self, reason: &str) {
        self.logger.log_stopped(reason);
        self.stopped = true;
    }

    pub fn status(&self) -> DetectorStatus {
        let phase = if self.stopped {
            DetectorPhase::Stopped
        } else if self.calibrator.is_calibrated() {
            DetectorPhase::Monitoring
        } else {
            DetectorPhase::Calibrating
        };
        let smoke_active = self.detector.is_active();

        DetectorStatus {
            phase,
            baseline: self.calibrator.baseline(),
            samples_collected: self.calibrator.samples_collected(),
            frames_since_calibration: self.detector.frame_count(),
            max_intensity_seen: self.detector.max_intensity_seen(),
            stream_restarts: self.stream_restarts,
            alert_count: self.store.len(),
            smoke_active,
            risk_level: DetectorStatus::risk_for(smoke_active),
            updated_at: Utc::now(),
            ..DetectorStatus::initial(self.calibrator.target())
        }
    }

    pub fn event_state(&self) -> EventState {
        self.detector.state()
    }

    pub fn baseline(&self) -> Option<f64> {
        self.calibrator.baseline()
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrator.is_calibrated()
    }

    pub fn stream_restarts(&self) -> u64 {
        self.stream_restarts
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn logger(&self) -> &DetectionLogger {
        &self.logger
    }
}

fn persist_snapshot(snapshots: &dyn SnapshotWriter, frame: &Frame, name: &str) -> Option<String> {
    match snapshots.save(frame, name) {
        Ok(stored) => Some(stored),
        Err(e) => {
            warn!(snapshot = name, "Failed to save snapshot: {}", e);
            metrics::record_snapshot_failure();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sentinelx_media::{FsSnapshotWriter, MediaError};

    use super::*;
    use crate::clock::ManualClock;

    fn pipeline() -> (DetectionPipeline<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Utc::now());
        let pipeline =
            DetectionPipeline::new(DetectorConfig::default(), AlertStore::new(), clock.clone())
                .unwrap();
        (pipeline, clock)
    }

    fn feed(pipeline: &mut DetectionPipeline<ManualClock>, intensity: f64) -> FrameOutcome {
        pipeline.process_reading(Ok(intensity), |name| Some(name.to_string()))
    }

    fn calibrate(pipeline: &mut DetectionPipeline<ManualClock>, level: f64) {
        for _ in 0..30 {
            feed(pipeline, level);
        }
        assert_eq!(pipeline.baseline(), Some(level));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DetectorConfig::default().with_thresholds(-2.0, -5.0);
        assert!(DetectionPipeline::system(config, AlertStore::new()).is_err());
    }

    #[test]
    fn test_steady_scene_never_alerts() {
        let (mut pipeline, _) = pipeline();
        for i in 0..29 {
            assert_eq!(
                feed(&mut pipeline, 100.0),
                FrameOutcome::Calibrating {
                    collected: i + 1,
                    target: 30
                }
            );
        }
        assert_eq!(
            feed(&mut pipeline, 100.0),
            FrameOutcome::Calibrated { baseline: 100.0 }
        );

        let outcome = feed(&mut pipeline, 100.0);
        assert!(matches!(outcome, FrameOutcome::Classified(c) if c.delta == 0.0));
        assert!(pipeline.store().is_empty());
        assert_eq!(pipeline.event_state(), EventState::Idle);
    }

    #[test]
    fn test_single_event_raises_one_alert() {
        let (mut pipeline, _) = pipeline();
        calibrate(&mut pipeline, 100.0);

        let outcome = feed(&mut pipeline, 94.0);
        let alert = outcome.alert().cloned().unwrap();
        assert_eq!(alert.intensity, 94.0);
        assert_eq!(alert.delta, -6.0);
        assert_eq!(alert.snapshot, Some(format!("snapshot_{}.jpg", alert.id)));

        for level in [93.0, 96.0] {
            assert!(feed(&mut pipeline, level).alert().is_none());
            assert_eq!(pipeline.event_state(), EventState::Active);
        }
        assert!(feed(&mut pipeline, 99.0).alert().is_none());
        assert_eq!(pipeline.event_state(), EventState::Idle);
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_dead_zone_oscillation_raises_one_alert() {
        let (mut pipeline, _) = pipeline();
        calibrate(&mut pipeline, 100.0);

        for level in [94.0, 97.0, 94.0, 97.0, 94.0] {
            feed(&mut pipeline, level);
        }
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_cooldown_suppresses_second_event() {
        let (mut pipeline, clock) = pipeline();
        calibrate(&mut pipeline, 100.0);

        assert!(feed(&mut pipeline, 94.0).alert().is_some());
        feed(&mut pipeline, 99.0);

        clock.advance(Duration::from_secs(2));
        assert!(matches!(
            feed(&mut pipeline, 94.0),
            FrameOutcome::Suppressed(c) if c.event_started()
        ));
        feed(&mut pipeline, 99.0);

        clock.advance(Duration::from_secs(4));
        assert!(feed(&mut pipeline, 94.0).alert().is_some());
        assert_eq!(pipeline.store().len(), 2);
    }

    #[test]
    fn test_alerts_spaced_by_cooldown() {
        let (mut pipeline, clock) = pipeline();
        calibrate(&mut pipeline, 100.0);

        for _ in 0..40 {
            feed(&mut pipeline, 94.0);
            feed(&mut pipeline, 100.0);
            clock.advance(Duration::from_millis(700));
        }

        let alerts = pipeline.store().list_newest_first();
        assert!(alerts.len() > 1);
        for pair in alerts.windows(2) {
            let gap = pair[0].created_at - pair[1].created_at;
            assert!(gap >= chrono::Duration::seconds(5));
        }
    }

    #[test]
    fn test_stream_restart_recalibrates_and_keeps_alerts() {
        let (mut pipeline, _) = pipeline();
        calibrate(&mut pipeline, 100.0);
        feed(&mut pipeline, 94.0);
        assert_eq!(pipeline.event_state(), EventState::Active);

        pipeline.on_stream_restart();
        assert!(!pipeline.is_calibrated());
        assert_eq!(pipeline.event_state(), EventState::Idle);
        assert_eq!(pipeline.stream_restarts(), 1);
        assert_eq!(pipeline.store().len(), 1);

        for _ in 0..29 {
            assert!(matches!(
                feed(&mut pipeline, 50.0),
                FrameOutcome::Calibrating { .. }
            ));
        }
        assert_eq!(
            feed(&mut pipeline, 50.0),
            FrameOutcome::Calibrated { baseline: 50.0 }
        );
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_external_reset_clears_alerts_but_keeps_cooldown() {
        let (mut pipeline, clock) = pipeline();
        calibrate(&mut pipeline, 100.0);
        feed(&mut pipeline, 94.0);

        assert_eq!(pipeline.on_external_reset(), 1);
        assert!(pipeline.store().is_empty());
        assert!(!pipeline.is_calibrated());

        clock.advance(Duration::from_secs(1));
        calibrate(&mut pipeline, 100.0);
        assert!(matches!(
            feed(&mut pipeline, 94.0),
            FrameOutcome::Suppressed(_)
        ));
        assert!(pipeline.store().is_empty());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let (mut pipeline, _) = pipeline();
        calibrate(&mut pipeline, 100.0);
        feed(&mut pipeline, 90.0);

        pipeline.on_external_reset();
        let once = pipeline.status();
        assert_eq!(pipeline.on_external_reset(), 0);
        let twice = pipeline.status();

        assert_eq!(once.phase, twice.phase);
        assert_eq!(once.baseline, twice.baseline);
        assert_eq!(once.samples_collected, twice.samples_collected);
        assert_eq!(once.smoke_active, twice.smoke_active);
        assert_eq!(once.alert_count, twice.alert_count);
    }

    #[test]
    fn test_late_reset_recalibrates_and_keeps_alerts() {
        let (mut pipeline, _) = pipeline();
        calibrate(&mut pipeline, 100.0);
        feed(&mut pipeline, 90.0);
        assert_eq!(pipeline.store().len(), 1);

        pipeline.on_late_reset();

        assert_eq!(pipeline.store().len(), 1);
        assert!(!pipeline.is_calibrated());
        assert_eq!(pipeline.event_state(), EventState::Idle);
        assert_eq!(pipeline.status().phase, DetectorPhase::Calibrating);
    }

    #[test]
    fn test_extraction_failure_during_calibration_adds_no_sample() {
        let (mut pipeline, _) = pipeline();
        feed(&mut pipeline, 100.0);

        let outcome = pipeline.process_reading(
            Err(MediaError::EmptyFrame { width: 0, height: 0 }),
            |_| None,
        );
        assert_eq!(outcome, FrameOutcome::Degraded);
        assert_eq!(pipeline.status().samples_collected, 1);
    }

    #[test]
    fn test_extraction_failure_keeps_event_open() {
        let (mut pipeline, _) = pipeline();
        calibrate(&mut pipeline, 100.0);
        feed(&mut pipeline, 90.0);

        pipeline.process_reading(Err(MediaError::decode_failed("bad frame")), |_| None);
        assert_eq!(pipeline.event_state(), EventState::Active);
        assert_eq!(pipeline.status().frames_since_calibration, 2);
    }

    #[test]
    fn test_snapshot_failure_still_records_alert() {
        let (mut pipeline, _) = pipeline();
        calibrate(&mut pipeline, 100.0);

        let outcome = pipeline.process_reading(Ok(80.0), |_| None);
        let alert = outcome.alert().unwrap();
        assert!(!alert.has_snapshot());
        assert_eq!(pipeline.store().len(), 1);
    }

    #[test]
    fn test_process_frame_writes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let writer = FsSnapshotWriter::new(dir.path());
        let (mut pipeline, _) = pipeline();

        for i in 0..30 {
            pipeline.process_frame(&Frame::gray(8, 8, 100, i), &writer);
        }
        let outcome = pipeline.process_frame(&Frame::gray(8, 8, 60, 30), &writer);

        let name = outcome.alert().and_then(|a| a.snapshot.clone()).unwrap();
        assert!(dir.path().join(&name).exists());
    }

    #[test]
    fn test_status_reflects_lifecycle() {
        let (mut pipeline, _) = pipeline();
        assert_eq!(pipeline.status().phase, DetectorPhase::Calibrating);

        calibrate(&mut pipeline, 100.0);
        feed(&mut pipeline, 90.0);
        let status = pipeline.status();
        assert_eq!(status.phase, DetectorPhase::Monitoring);
        assert!(status.smoke_active);
        assert_eq!(status.alert_count, 1);
        assert_eq!(status.max_intensity_seen, 100.0);

        pipeline.mark_stopped("source exhausted");
        assert_eq!(pipeline.status().phase, DetectorPhase::Stopped);
    }
}
