//! Baseline calibration.
//!
//! The first N intensities of a run are assumed to show a smoke-free scene;
//! their arithmetic mean becomes the baseline for the rest of the run.

/// Collects the calibration window and produces the baseline once.
#[derive(Debug, Clone)]
pub struct BaselineCalibrator {
    target: usize,
    samples: Vec<f64>,
    baseline: Option<f64>,
}

impl BaselineCalibrator {
    pub fn new(target: usize) -> Self {
        let target = target.max(1);
        Self {
            target,
            samples: Vec::with_capacity(target),
            baseline: None,
        }
    }

    /// Record one sample.
    ///
    /// Returns the baseline exactly once, on the sample that completes the
    /// window. Samples offered after calibration are ignored; the baseline
    /// only changes through [`reset`](Self::reset).
    pub fn observe(&mut self, intensity: f64) -> Option<f64> {
        if self.baseline.is_some() {
            return None;
        }

        self.samples.push(intensity);
        if self.samples.len() < self.target {
            return None;
        }

        let baseline = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        self.baseline = Some(baseline);
        Some(baseline)
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn samples_collected(&self) -> usize {
        self.samples.len()
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.baseline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_samples_give_that_baseline() {
        let mut calibrator = BaselineCalibrator::new(30);
        for _ in 0..29 {
            assert_eq!(calibrator.observe(100.0), None);
        }
        assert_eq!(calibrator.observe(100.0), Some(100.0));
        assert_eq!(calibrator.baseline(), Some(100.0));
    }

    #[test]
    fn test_baseline_is_arithmetic_mean() {
        let mut calibrator = BaselineCalibrator::new(4);
        let results: Vec<_> = [10.0, 20.0, 30.0, 60.0]
            .into_iter()
            .map(|s| calibrator.observe(s))
            .collect();

        assert_eq!(results, vec![None, None, None, Some(30.0)]);
    }

    #[test]
    fn test_calibration_completes_exactly_once() {
        for target in 1..10 {
            let mut calibrator = BaselineCalibrator::new(target);
            let completions = (0..target * 3)
                .map(|i| calibrator.observe(i as f64))
                .filter(Option::is_some)
                .count();

            assert_eq!(completions, 1, "target {target}");
            let expected = (0..target).map(|i| i as f64).sum::<f64>() / target as f64;
            assert_eq!(calibrator.baseline(), Some(expected));
            assert_eq!(calibrator.samples_collected(), target);
        }
    }

    #[test]
    fn test_reset_restarts_from_zero() {
        let mut calibrator = BaselineCalibrator::new(3);
        calibrator.observe(50.0);
        calibrator.observe(50.0);
        calibrator.reset();

        assert_eq!(calibrator.samples_collected(), 0);
        assert!(!calibrator.is_calibrated());
        assert_eq!(calibrator.observe(90.0), None);
        assert_eq!(calibrator.observe(90.0), None);
        assert_eq!(calibrator.observe(90.0), Some(90.0));
    }

    #[test]
    fn test_zero_target_is_clamped() {
        let mut calibrator = BaselineCalibrator::new(0);
        assert_eq!(calibrator.target(), 1);
        assert_eq!(calibrator.observe(7.0), Some(7.0));
    }
}
