//! Detection metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder. Without a recorder these calls are no-ops.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_PROCESSED_TOTAL: &str = "sentinelx_frames_processed_total";
    pub const FRAME_PROCESSING_SECONDS: &str = "sentinelx_frame_processing_seconds";
    pub const FRAME_DEADLINE_MISSES_TOTAL: &str = "sentinelx_frame_deadline_misses_total";
    pub const EXTRACTION_FAILURES_TOTAL: &str = "sentinelx_extraction_failures_total";

    pub const EVENTS_STARTED_TOTAL: &str = "sentinelx_events_started_total";
    pub const ALERTS_CREATED_TOTAL: &str = "sentinelx_alerts_created_total";
    pub const ALERTS_SUPPRESSED_TOTAL: &str = "sentinelx_alerts_suppressed_total";
    pub const SNAPSHOT_FAILURES_TOTAL: &str = "sentinelx_snapshot_failures_total";

    pub const STREAM_RESTARTS_TOTAL: &str = "sentinelx_stream_restarts_total";
    pub const RESETS_TOTAL: &str = "sentinelx_resets_total";

    pub const BASELINE_INTENSITY: &str = "sentinelx_baseline_intensity";
    pub const CURRENT_INTENSITY: &str = "sentinelx_current_intensity";
    pub const SMOKE_ACTIVE: &str = "sentinelx_smoke_active";
}

/// Record one processed frame and how long it took.
pub fn record_frame(duration_secs: f64) {
    counter!(names::FRAMES_PROCESSED_TOTAL).increment(1);
    histogram!(names::FRAME_PROCESSING_SECONDS).record(duration_secs);
}

pub fn record_deadline_miss() {
    counter!(names::FRAME_DEADLINE_MISSES_TOTAL).increment(1);
}

pub fn record_extraction_failure() {
    counter!(names::EXTRACTION_FAILURES_TOTAL).increment(1);
}

pub fn record_event_started() {
    counter!(names::EVENTS_STARTED_TOTAL).increment(1);
}

/// Record an alert outcome: created or suppressed by cooldown.
pub fn record_alert(created: bool) {
    if created {
        counter!(names::ALERTS_CREATED_TOTAL).increment(1);
    } else {
        counter!(names::ALERTS_SUPPRESSED_TOTAL).increment(1);
    }
}

pub fn record_snapshot_failure() {
    counter!(names::SNAPSHOT_FAILURES_TOTAL).increment(1);
}

pub fn record_stream_restart() {
    counter!(names::STREAM_RESTARTS_TOTAL).increment(1);
}

pub fn record_reset() {
    counter!(names::RESETS_TOTAL).increment(1);
}

/// Update the intensity gauges. `baseline` is cleared to zero while calibrating.
pub fn set_intensity(intensity: f64, baseline: Option<f64>) {
    gauge!(names::CURRENT_INTENSITY).set(intensity);
    gauge!(names::BASELINE_INTENSITY).set(baseline.unwrap_or(0.0));
}

pub fn set_smoke_active(active: bool) {
    gauge!(names::SMOKE_ACTIVE).set(if active { 1.0 } else { 0.0 });
}
