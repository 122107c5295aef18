//! End-to-end detection scenarios through the public pipeline API.

use std::time::Duration;

use chrono::Utc;
use sentinelx_detector::{
    AlertStore, DetectionPipeline, DetectorConfig, EventState, FrameOutcome, ManualClock,
    Transition,
};
use sentinelx_models::DetectorPhase;

struct Harness {
    pipeline: DetectionPipeline<ManualClock>,
    clock: ManualClock,
    alerts: AlertStore,
}

impl Harness {
    fn new() -> Self {
        let clock = ManualClock::new(Utc::now());
        let alerts = AlertStore::new();
        let pipeline =
            DetectionPipeline::new(DetectorConfig::default(), alerts.clone(), clock.clone())
                .unwrap();
        Self {
            pipeline,
            clock,
            alerts,
        }
    }

    fn feed(&mut self, intensity: f64) -> FrameOutcome {
        self.pipeline
            .process_reading(Ok(intensity), |name| Some(name.to_string()))
    }

    fn feed_n(&mut self, intensity: f64, n: usize) {
        for _ in 0..n {
            self.feed(intensity);
        }
    }
}

#[test]
fn steady_scene_calibrates_without_alerting() {
    let mut h = Harness::new();
    h.feed_n(100.0, 30);

    assert_eq!(h.pipeline.baseline(), Some(100.0));
    assert!(h.alerts.is_empty());
}

#[test]
fn darkening_then_recovery_raises_exactly_one_alert() {
    let mut h = Harness::new();
    h.feed_n(100.0, 30);

    let alert = h.feed(90.0).alert().cloned().expect("first event alerts");
    assert!((alert.delta + 10.0).abs() < 1e-9);
    assert_eq!(h.pipeline.event_state(), EventState::Active);

    h.clock.advance(Duration::from_millis(40));
    match h.feed(85.0) {
        FrameOutcome::Classified(c) => assert_eq!(c.transition, Transition::Sustained),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(h.alerts.len(), 1);

    match h.feed(99.0) {
        FrameOutcome::Classified(c) => assert_eq!(c.transition, Transition::Ended),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(h.pipeline.event_state(), EventState::Idle);
    assert_eq!(h.alerts.len(), 1);
}

#[test]
fn stream_loop_mid_calibration_restarts_window() {
    let mut h = Harness::new();
    h.feed_n(100.0, 10);
    assert_eq!(h.pipeline.status().samples_collected, 10);

    h.pipeline.on_stream_restart();
    assert_eq!(h.pipeline.status().samples_collected, 0);

    h.feed_n(60.0, 29);
    assert!(!h.pipeline.is_calibrated());
    assert_eq!(
        h.feed(60.0),
        FrameOutcome::Calibrated { baseline: 60.0 }
    );
}

#[test]
fn reset_then_new_event_after_cooldown_alerts_again() {
    let mut h = Harness::new();
    h.feed_n(100.0, 30);
    h.feed(90.0);
    assert_eq!(h.alerts.len(), 1);

    assert_eq!(h.pipeline.on_external_reset(), 1);
    assert_eq!(h.pipeline.status().phase, DetectorPhase::Calibrating);

    h.clock.advance(Duration::from_secs(6));
    h.feed_n(100.0, 30);
    assert!(h.feed(90.0).alert().is_some());
    assert_eq!(h.alerts.len(), 1);
}

#[test]
fn no_two_alerts_closer_than_cooldown() {
    let mut h = Harness::new();
    h.feed_n(100.0, 30);

    for step in 0..100u64 {
        h.feed(if step % 2 == 0 { 80.0 } else { 100.0 });
        h.clock.advance(Duration::from_millis(333));
    }

    let alerts = h.alerts.list_newest_first();
    assert!(alerts.len() >= 2);
    for pair in alerts.windows(2) {
        assert!(pair[0].created_at - pair[1].created_at >= chrono::Duration::seconds(5));
        assert!(pair[0].id > pair[1].id);
    }
}
