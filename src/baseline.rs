//! Per-athlete HRV baseline tracking
//!
//! Maintains an exponentially weighted baseline of RMSSD readings so the
//! classifier can judge today's HRV against the athlete's own normal range
//! rather than population values. Slow adaptation (alpha 0.1) keeps a single
//! bad night from dragging the baseline down.

use serde::{Deserialize, Serialize};

/// Smoothing factor for baseline updates
const BASELINE_ALPHA: f64 = 0.1;

/// Measurements required before the baseline is trusted
const MIN_SAMPLES: usize = 7;

/// Exponentially weighted RMSSD baseline for one athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrvBaseline {
    /// Smoothed mean RMSSD in milliseconds
    pub rmssd_mean: f64,

    /// Smoothed RMSSD variance
    pub rmssd_variance: f64,

    /// Number of readings folded into the baseline
    pub sample_count: usize,
}

impl Default for HrvBaseline {
    fn default() -> Self {
        HrvBaseline {
            rmssd_mean: 0.0,
            rmssd_variance: 0.0,
            sample_count: 0,
        }
    }
}

impl HrvBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a baseline from an ordered history of RMSSD readings.
    /// Non-finite and non-positive readings are ignored.
    pub fn from_history(readings: &[f64]) -> Self {
        let mut baseline = Self::new();
        for &value in readings {
            baseline.update(value);
        }
        baseline
    }

    /// Fold one RMSSD reading into the baseline
    pub fn update(&mut self, rmssd: f64) {
        if !rmssd.is_finite() || rmssd <= 0.0 {
            return;
        }

        if self.sample_count == 0 {
            self.rmssd_mean = rmssd;
            self.rmssd_variance = 0.0;
        } else {
            let delta = rmssd - self.rmssd_mean;
            self.rmssd_mean += BASELINE_ALPHA * delta;
            self.rmssd_variance =
                (1.0 - BASELINE_ALPHA) * (self.rmssd_variance + BASELINE_ALPHA * delta * delta);
        }
        self.sample_count += 1;
    }

    /// Whether enough readings have accumulated to trust the baseline
    pub fn is_established(&self) -> bool {
        self.sample_count >= MIN_SAMPLES && self.rmssd_mean > 0.0
    }

    /// Smoothed standard deviation of RMSSD
    pub fn rmssd_std(&self) -> f64 {
        self.rmssd_variance.max(0.0).sqrt()
    }

    /// Today's reading as a fraction of the baseline mean.
    ///
    /// `Some(0.7)` means RMSSD is 30% below normal. Returns `None` until the
    /// baseline is established or when the reading is unusable.
    pub fn deviation_ratio(&self, rmssd: f64) -> Option<f64> {
        if !self.is_established() || !rmssd.is_finite() || rmssd <= 0.0 {
            return None;
        }
        Some(rmssd / self.rmssd_mean)
    }

    /// Z-score of today's reading against the baseline distribution
    pub fn z_score(&self, rmssd: f64) -> Option<f64> {
        if !self.is_established() || !rmssd.is_finite() {
            return None;
        }
        let std = self.rmssd_std();
        if std <= f64::EPSILON {
            return Some(0.0);
        }
        Some((rmssd - self.rmssd_mean) / std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_starts_empty() {
        let baseline = HrvBaseline::new();
        assert_eq!(baseline.sample_count, 0);
        assert!(!baseline.is_established());
        assert_eq!(baseline.deviation_ratio(50.0), None);
    }

    #[test]
    fn test_first_reading_sets_mean() {
        let mut baseline = HrvBaseline::new();
        baseline.update(62.0);
        assert_eq!(baseline.rmssd_mean, 62.0);
        assert_eq!(baseline.sample_count, 1);
    }

    #[test]
    fn test_baseline_establishes_after_enough_readings() {
        let readings = [60.0, 62.0, 58.0, 61.0, 63.0, 59.0, 60.0];
        let baseline = HrvBaseline::from_history(&readings);
        assert!(baseline.is_established());
        assert!(baseline.rmssd_mean > 55.0 && baseline.rmssd_mean < 65.0);
    }

    #[test]
    fn test_deviation_ratio_flags_suppressed_hrv() {
        let readings = [60.0; 10];
        let baseline = HrvBaseline::from_history(&readings);
        assert!((baseline.rmssd_mean - 60.0).abs() < 1e-9);

        let ratio = baseline.deviation_ratio(30.0).unwrap();
        assert!((ratio - 0.5).abs() < 1e-9);

        let ratio = baseline.deviation_ratio(60.0).unwrap();
        assert!((ratio - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_readings_ignored() {
        let mut baseline = HrvBaseline::from_history(&[60.0; 10]);
        let before = baseline.clone();

        baseline.update(f64::NAN);
        baseline.update(-5.0);
        baseline.update(0.0);
        assert_eq!(baseline, before);
    }

    #[test]
    fn test_slow_adaptation() {
        let mut baseline = HrvBaseline::from_history(&[60.0; 10]);
        baseline.update(30.0);

        // One suppressed night moves the mean by alpha of the gap only
        assert!((baseline.rmssd_mean - 57.0).abs() < 1e-9);
    }

    #[test]
    fn test_z_score_sign() {
        let readings = [55.0, 60.0, 65.0, 58.0, 62.0, 57.0, 63.0, 59.0];
        let baseline = HrvBaseline::from_history(&readings);

        let below = baseline.z_score(40.0).unwrap();
        assert!(below < 0.0);

        let above = baseline.z_score(80.0).unwrap();
        assert!(above > 0.0);
    }
}
