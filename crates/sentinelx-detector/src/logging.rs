//! Structured detection logging.
//!
//! Provides consistent, structured logging for the detection lifecycle with
//! the location and run number attached to every line.

use std::time::Duration;

use sentinelx_media::MediaError;
use sentinelx_models::Alert;
use tracing::{debug, error, info, warn, Span};

/// Detection logger with consistent contextual fields.
///
/// A run starts at launch and again after every stream loop or reset.
#[derive(Debug, Clone)]
pub struct DetectionLogger {
    location: String,
    run: u64,
}

impl DetectionLogger {
    pub fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            run: 1,
        }
    }

    /// Move on to the next run.
    pub fn next_run(&mut self) {
        self.run += 1;
    }

    pub fn log_baseline(&self, baseline: f64, samples: usize) {
        info!(
            location = %self.location,
            run = self.run,
            samples,
            "Baseline established: {:.2}", baseline
        );
    }

    pub fn log_monitor(&self, intensity: f64, baseline: f64, delta: f64, max_seen: f64, active: bool) {
        info!(
            location = %self.location,
            run = self.run,
            smoke_active = active,
            "Monitor: intensity={:.2} baseline={:.2} delta={:.2} max={:.2}",
            intensity, baseline, delta, max_seen
        );
    }

    pub fn log_event_started(&self, intensity: f64, delta: f64) {
        warn!(
            location = %self.location,
            run = self.run,
            "Smoke detected: intensity={:.2} delta={:.2}", intensity, delta
        );
    }

    pub fn log_event_ended(&self, intensity: f64, delta: f64) {
        info!(
            location = %self.location,
            run = self.run,
            "Smoke cleared: intensity={:.2} delta={:.2}", intensity, delta
        );
    }

    pub fn log_alert(&self, alert: &Alert) {
        warn!(
            location = %self.location,
            run = self.run,
            alert_id = %alert.id,
            snapshot = alert.snapshot.as_deref().unwrap_or("none"),
            "Alert created: {} {} at {}", alert.severity.as_str(), alert.kind.as_str(), alert.time
        );
    }

    pub fn log_alert_skipped(&self, remaining: Option<Duration>) {
        info!(
            location = %self.location,
            run = self.run,
            remaining_ms = remaining.map(|d| d.as_millis() as u64).unwrap_or(0),
            "Alert skipped: cooldown active"
        );
    }

    pub fn log_extraction_failed(&self, err: &MediaError) {
        warn!(
            location = %self.location,
            run = self.run,
            "Intensity extraction failed, using neutral reading: {}", err
        );
    }

    pub fn log_stream_restart(&self, max_seen: f64) {
        info!(
            location = %self.location,
            run = self.run,
            "Stream looped, recalibrating. Max intensity this run: {:.2}", max_seen
        );
    }

    pub fn log_reset(&self, cleared: usize) {
        info!(
            location = %self.location,
            run = self.run,
            cleared,
            "Detection reset"
        );
    }

    pub fn log_late_reset(&self) {
        warn!(
            location = %self.location,
            run = self.run,
            "Detection reset applied late, alert history left as is"
        );
    }

    pub fn log_stopped(&self, reason: &str) {
        error!(
            location = %self.location,
            run = self.run,
            "Detection stopped: {}", reason
        );
    }

    pub fn log_frame(&self, index: u64, intensity: f64) {
        debug!(run = self.run, frame = index, "Frame intensity {:.2}", intensity);
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    /// Create a tracing span for the pipeline worker.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("detection", location = %self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_runs() {
        let mut logger = DetectionLogger::new("Kitchen Module");
        assert_eq!(logger.location(), "Kitchen Module");
        assert_eq!(logger.run(), 1);

        logger.next_run();
        logger.next_run();
        assert_eq!(logger.run(), 3);
    }

    #[test]
    fn test_log_methods_do_not_panic() {
        let logger = DetectionLogger::new("Garage");
        logger.log_baseline(100.0, 30);
        logger.log_monitor(95.0, 100.0, -5.0, 101.0, false);
        logger.log_event_started(94.0, -6.0);
        logger.log_event_ended(99.0, -1.0);
        logger.log_alert_skipped(Some(Duration::from_secs(2)));
        logger.log_stream_restart(120.0);
        logger.log_reset(2);
        logger.log_late_reset();
        let _span = logger.create_span();
    }
}
