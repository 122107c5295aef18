//! Hysteresis event detection against a fixed baseline.

use crate::config::HysteresisThresholds;

/// Whether a smoke event is currently open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventState {
    #[default]
    Idle,
    Active,
}

/// What one classified frame did to the event state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle -> Active
    Started,
    /// Active -> Idle
    Ended,
    /// Stayed Active
    Sustained,
    /// Stayed Idle
    Quiet,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Started => "started",
            Transition::Ended => "ended",
            Transition::Sustained => "sustained",
            Transition::Quiet => "quiet",
        }
    }
}

/// Result of classifying one intensity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub transition: Transition,
    /// `intensity - baseline`
    pub delta: f64,
}

impl Classification {
    pub fn event_started(&self) -> bool {
        self.transition == Transition::Started
    }
}

/// Pure hysteresis step.
///
/// Idle opens on `delta < enter`, Active closes on `delta >= exit`. Deltas in
/// `[enter, exit)` never change state.
pub fn transition(
    state: EventState,
    delta: f64,
    thresholds: HysteresisThresholds,
) -> (EventState, Transition) {
    match state {
        EventState::Idle if delta < thresholds.enter => (EventState::Active, Transition::Started),
        EventState::Idle => (EventState::Idle, Transition::Quiet),
        EventState::Active if delta >= thresholds.exit => (EventState::Idle, Transition::Ended),
        EventState::Active => (EventState::Active, Transition::Sustained),
    }
}

/// Two-state detector with run diagnostics.
#[derive(Debug, Clone)]
pub struct EventDetector {
    thresholds: HysteresisThresholds,
    state: EventState,
    frame_count: u64,
    max_intensity_seen: f64,
}

impl EventDetector {
    pub fn new(thresholds: HysteresisThresholds) -> Self {
        Self {
            thresholds,
            state: EventState::Idle,
            frame_count: 0,
            max_intensity_seen: 0.0,
        }
    }

    /// Track the run maximum. Called for every successfully measured frame,
    /// calibration included.
    pub fn record_intensity(&mut self, intensity: f64) {
        if intensity > self.max_intensity_seen {
            self.max_intensity_seen = intensity;
        }
    }

    /// Classify one post-calibration intensity and apply the transition.
    pub fn classify(&mut self, intensity: f64, baseline: f64) -> Classification {
        let delta = intensity - baseline;
        let (next, transition) = transition(self.state, delta, self.thresholds);
        self.state = next;
        self.frame_count += 1;
        Classification { transition, delta }
    }

    /// Count a frame whose intensity could not be measured.
    ///
    /// The state is left untouched and the reported delta is zero.
    pub fn neutral(&mut self) -> Classification {
        self.frame_count += 1;
        let transition = match self.state {
            EventState::Idle => Transition::Quiet,
            EventState::Active => Transition::Sustained,
        };
        Classification {
            transition,
            delta: 0.0,
        }
    }

    pub fn state(&self) -> EventState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == EventState::Active
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn max_intensity_seen(&self) -> f64 {
        self.max_intensity_seen
    }

    pub fn thresholds(&self) -> HysteresisThresholds {
        self.thresholds
    }

    pub fn reset(&mut self) {
        self.state = EventState::Idle;
        self.frame_count = 0;
        self.max_intensity_seen = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> HysteresisThresholds {
        HysteresisThresholds::new(-5.0, -2.0).unwrap()
    }

    fn run(detector: &mut EventDetector, intensities: &[f64]) -> Vec<Transition> {
        intensities
            .iter()
            .map(|&i| detector.classify(i, 100.0).transition)
            .collect()
    }

    #[test]
    fn test_transition_table() {
        let t = thresholds();
        assert_eq!(transition(EventState::Idle, -6.0, t), (EventState::Active, Transition::Started));
        assert_eq!(transition(EventState::Idle, -5.0, t), (EventState::Idle, Transition::Quiet));
        assert_eq!(transition(EventState::Active, -2.0, t), (EventState::Idle, Transition::Ended));
        assert_eq!(transition(EventState::Active, -3.0, t), (EventState::Active, Transition::Sustained));
        assert_eq!(transition(EventState::Active, 4.0, t), (EventState::Idle, Transition::Ended));
    }

    #[test]
    fn test_single_event_through_dip() {
        let mut detector = EventDetector::new(thresholds());
        let transitions = run(&mut detector, &[100.0, 94.0, 93.0, 96.0, 99.0]);

        assert_eq!(
            transitions,
            vec![
                Transition::Quiet,
                Transition::Started,
                Transition::Sustained,
                Transition::Sustained,
                Transition::Ended,
            ]
        );
        assert!(!detector.is_active());
    }

    #[test]
    fn test_dead_zone_oscillation_starts_once() {
        let mut detector = EventDetector::new(thresholds());
        let transitions = run(&mut detector, &[94.0, 97.0, 94.0, 97.0, 94.0]);

        let starts = transitions.iter().filter(|t| **t == Transition::Started).count();
        assert_eq!(starts, 1);
        assert!(detector.is_active());
    }

    #[test]
    fn test_brightening_never_starts_event() {
        let mut detector = EventDetector::new(thresholds());
        let transitions = run(&mut detector, &[120.0, 200.0, 255.0]);

        assert!(transitions.iter().all(|t| *t == Transition::Quiet));
        assert_eq!(detector.max_intensity_seen(), 0.0);
    }

    #[test]
    fn test_neutral_keeps_state() {
        let mut detector = EventDetector::new(thresholds());
        detector.classify(90.0, 100.0);
        assert!(detector.is_active());

        let c = detector.neutral();
        assert_eq!(c.transition, Transition::Sustained);
        assert_eq!(c.delta, 0.0);
        assert!(detector.is_active());
        assert_eq!(detector.frame_count(), 2);
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut detector = EventDetector::new(thresholds());
        detector.record_intensity(120.0);
        detector.classify(90.0, 100.0);
        detector.reset();

        assert_eq!(detector.state(), EventState::Idle);
        assert_eq!(detector.frame_count(), 0);
        assert_eq!(detector.max_intensity_seen(), 0.0);
    }
}
