//! Cooldown-gated alert creation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sentinelx_media::snapshot_name;
use sentinelx_models::{Alert, AlertId};
use tracing::debug;

/// Turns event starts into alerts, at most one per cooldown window.
///
/// The last-alert timestamp is process-wide: it survives stream loops and
/// external resets, so a freshly reset pipeline can still be inside the
/// previous cooldown.
#[derive(Debug, Clone)]
pub struct AlertGate {
    cooldown: Duration,
    location: String,
    last_alert_at: Option<DateTime<Utc>>,
    last_id: Option<AlertId>,
}

impl AlertGate {
    pub fn new(cooldown: Duration, location: impl Into<String>) -> Self {
        Self {
            cooldown,
            location: location.into(),
            last_alert_at: None,
            last_id: None,
        }
    }

    /// Time left before another alert may fire, if any.
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let last = self.last_alert_at?;
        match now.signed_duration_since(last).to_std() {
            Ok(elapsed) if elapsed >= self.cooldown => None,
            Ok(elapsed) => Some(self.cooldown - elapsed),
            // Clock went backwards; keep the window closed.
            Err(_) => Some(self.cooldown),
        }
    }

    /// Create an alert for an event start unless still cooling down.
    ///
    /// `persist` receives the snapshot file name derived from the alert id
    /// and returns the stored name, or `None` if saving failed. The alert is
    /// created either way.
    pub fn try_fire<F>(
        &mut self,
        now: DateTime<Utc>,
        intensity: f64,
        delta: f64,
        persist: F,
    ) -> Option<Alert>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        if let Some(remaining) = self.cooldown_remaining(now) {
            debug!(
                remaining_ms = remaining.as_millis() as u64,
                "Alert skipped by cooldown"
            );
            return None;
        }

        let id = AlertId::after(self.last_id, now);
        let snapshot = persist(&snapshot_name(id));
        let alert = Alert::smoke(id, self.location.clone(), intensity, delta, snapshot, now);

        self.last_alert_at = Some(now);
        self.last_id = Some(id);
        Some(alert)
    }

    pub fn last_alert_at(&self) -> Option<DateTime<Utc>> {
        self.last_alert_at
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(name: &str) -> Option<String> {
        Some(name.to_string())
    }

    #[test]
    fn test_first_event_fires() {
        let mut gate = AlertGate::new(Duration::from_secs(5), "Kitchen Module");
        let now = Utc::now();

        let alert = gate.try_fire(now, 94.0, -6.0, saved).unwrap();
        assert_eq!(alert.location, "Kitchen Module");
        assert_eq!(alert.snapshot, Some(format!("snapshot_{}.jpg", alert.id)));
        assert_eq!(gate.last_alert_at(), Some(now));
    }

    #[test]
    fn test_cooldown_suppresses_then_reopens() {
        let mut gate = AlertGate::new(Duration::from_secs(5), "Kitchen Module");
        let start = Utc::now();

        assert!(gate.try_fire(start, 94.0, -6.0, saved).is_some());
        assert!(gate
            .try_fire(start + chrono::Duration::seconds(2), 94.0, -6.0, saved)
            .is_none());
        assert!(gate
            .try_fire(start + chrono::Duration::milliseconds(4999), 94.0, -6.0, saved)
            .is_none());
        assert!(gate
            .try_fire(start + chrono::Duration::seconds(5), 94.0, -6.0, saved)
            .is_some());
    }

    #[test]
    fn test_suppressed_event_does_not_extend_cooldown() {
        let mut gate = AlertGate::new(Duration::from_secs(5), "Kitchen Module");
        let start = Utc::now();

        gate.try_fire(start, 94.0, -6.0, saved);
        gate.try_fire(start + chrono::Duration::seconds(4), 94.0, -6.0, saved);

        assert_eq!(gate.last_alert_at(), Some(start));
        assert!(gate
            .try_fire(start + chrono::Duration::seconds(6), 94.0, -6.0, saved)
            .is_some());
    }

    #[test]
    fn test_persist_not_called_when_suppressed() {
        let mut gate = AlertGate::new(Duration::from_secs(5), "Kitchen Module");
        let start = Utc::now();
        gate.try_fire(start, 94.0, -6.0, saved);

        let mut called = false;
        let result = gate.try_fire(start, 94.0, -6.0, |_| {
            called = true;
            None
        });
        assert!(result.is_none());
        assert!(!called);
    }

    #[test]
    fn test_failed_snapshot_still_alerts() {
        let mut gate = AlertGate::new(Duration::from_secs(5), "Kitchen Module");
        let alert = gate.try_fire(Utc::now(), 90.0, -10.0, |_| None).unwrap();
        assert!(!alert.has_snapshot());
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut gate = AlertGate::new(Duration::ZERO, "Kitchen Module");
        let now = Utc::now();

        let first = gate.try_fire(now, 90.0, -10.0, saved).unwrap();
        let second = gate.try_fire(now, 90.0, -10.0, saved).unwrap();
        assert!(second.id > first.id);
        assert_ne!(first.snapshot, second.snapshot);
    }

    #[test]
    fn test_clock_going_backwards_stays_closed() {
        let mut gate = AlertGate::new(Duration::from_secs(5), "Kitchen Module");
        let now = Utc::now();
        gate.try_fire(now, 90.0, -10.0, saved);

        let earlier = now - chrono::Duration::seconds(30);
        assert_eq!(gate.cooldown_remaining(earlier), Some(Duration::from_secs(5)));
    }
}
