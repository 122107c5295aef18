//! Detector configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{DetectorError, DetectorResult};

/// Enter/exit thresholds on `delta = intensity - baseline`.
///
/// Smoke darkens the scene, so both are negative; `exit` must sit strictly
/// above `enter` to leave a dead zone between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisThresholds {
    /// An idle detector opens an event when `delta < enter`
    pub enter: f64,
    /// An active detector closes the event when `delta >= exit`
    pub exit: f64,
}

impl HysteresisThresholds {
    pub fn new(enter: f64, exit: f64) -> DetectorResult<Self> {
        if !enter.is_finite() || !exit.is_finite() {
            return Err(DetectorError::config(format!(
                "thresholds must be finite (delta={enter}, return={exit})"
            )));
        }
        if exit <= enter {
            return Err(DetectorError::config(format!(
                "return threshold ({exit}) must be greater than delta threshold ({enter})"
            )));
        }
        Ok(Self { enter, exit })
    }
}

/// Detection pipeline configuration.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Frames averaged into the baseline at the start of each run
    pub baseline_frame_count: usize,
    /// Delta below which an event starts (negative: darkening)
    pub delta_threshold: f64,
    /// Delta at or above which an active event ends
    pub return_threshold: f64,
    /// Minimum time between two alerts
    pub cooldown: Duration,
    /// Emit a monitor log line every N classified frames (0 disables)
    pub monitor_log_interval: u64,
    /// Location name stamped on alerts
    pub location: String,
    /// Frame pacing for the runner
    pub target_fps: u32,
    /// Pause after a stream loop before reading again
    pub restart_delay: Duration,
    /// JPEG quality for streamed frames
    pub jpeg_quality: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            baseline_frame_count: 30,
            delta_threshold: -5.0,
            return_threshold: -2.0,
            cooldown: Duration::from_secs(5),
            monitor_log_interval: 30,
            location: "Kitchen Module".to_string(),
            target_fps: 30,
            restart_delay: Duration::from_millis(50),
            jpeg_quality: 80,
        }
    }
}

impl DetectorConfig {
    /// Create config from environment variables.
    ///
    /// Unset variables take their defaults; a variable that is set but does
    /// not parse is a configuration error.
    pub fn from_env() -> DetectorResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DetectorResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            baseline_frame_count: parse_var(
                &lookup,
                "SENTINEL_BASELINE_FRAMES",
                defaults.baseline_frame_count,
            )?,
            delta_threshold: parse_var(
                &lookup,
                "SENTINEL_DELTA_THRESHOLD",
                defaults.delta_threshold,
            )?,
            return_threshold: parse_var(
                &lookup,
                "SENTINEL_RETURN_THRESHOLD",
                defaults.return_threshold,
            )?,
            cooldown: Duration::from_secs(parse_var(
                &lookup,
                "SENTINEL_ALERT_COOLDOWN_SECS",
                defaults.cooldown.as_secs(),
            )?),
            monitor_log_interval: parse_var(
                &lookup,
                "SENTINEL_MONITOR_LOG_INTERVAL",
                defaults.monitor_log_interval,
            )?,
            location: lookup("SENTINEL_LOCATION").unwrap_or(defaults.location),
            target_fps: parse_var(&lookup, "SENTINEL_TARGET_FPS", defaults.target_fps)?,
            restart_delay: Duration::from_millis(parse_var(
                &lookup,
                "SENTINEL_RESTART_DELAY_MS",
                defaults.restart_delay.as_millis() as u64,
            )?),
            jpeg_quality: parse_var(&lookup, "SENTINEL_JPEG_QUALITY", defaults.jpeg_quality)?,
        })
    }

    /// Reject configurations that break detection invariants.
    pub fn validate(&self) -> DetectorResult<()> {
        self.thresholds()?;

        if self.baseline_frame_count == 0 {
            return Err(DetectorError::config("baseline frame count must be at least 1"));
        }
        if self.target_fps == 0 {
            return Err(DetectorError::config("target fps must be at least 1"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(DetectorError::config(format!(
                "jpeg quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }

        Ok(())
    }

    /// Validated hysteresis thresholds.
    pub fn thresholds(&self) -> DetectorResult<HysteresisThresholds> {
        HysteresisThresholds::new(self.delta_threshold, self.return_threshold)
    }

    /// Time budget for one frame at the target rate.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }

    /// Builder-style setter for both thresholds.
    pub fn with_thresholds(mut self, delta_threshold: f64, return_threshold: f64) -> Self {
        self.delta_threshold = delta_threshold;
        self.return_threshold = return_threshold;
        self
    }

    /// Builder-style setter for the calibration window.
    pub fn with_baseline_frames(mut self, frames: usize) -> Self {
        self.baseline_frame_count = frames;
        self
    }

    /// Builder-style setter for the alert cooldown.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Builder-style setter for frame pacing.
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Builder-style setter for the post-loop pause.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> DetectorResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DetectorError::config(format!("{name}={raw:?} is invalid: {e}"))),
    }
}
