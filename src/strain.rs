//! Strain accumulation and target monitoring
//!
//! Two halves: turning intraday heart-rate samples into a cumulative strain
//! score on the familiar 0-21 scale, and checking that score against the
//! day's target ceiling.
//!
//! Strain uses Edwards TRIMP: each sample contributes its duration in
//! minutes weighted by heart-rate-reserve zone, and the running TRIMP maps
//! onto 0-21 with `21 * ln(TRIMP + 1) / ln(7201)`. The log keeps early
//! minutes cheap and makes the ceiling genuinely hard to reach.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Intensity, StrainSample};

/// Ceiling of the strain scale
pub const MAX_STRAIN: f64 = 21.0;

/// TRIMP that anchors strain 21: 24 hours at the top zone weight
/// (24 * 60 * 5 = 7200), plus one for the log offset.
const TRIMP_CEILING: f64 = 7201.0;

/// Gaps between samples longer than this are clamped, so a dropped
/// recording does not credit hours of strain.
const MAX_SAMPLE_GAP_SECS: u32 = 300;

/// Strain targets and deload behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainConfig {
    /// Day strain ceiling for a light session
    pub light_target: f64,

    /// Day strain ceiling for a moderate session
    pub moderate_target: f64,

    /// Day strain ceiling for a high-intensity session
    pub high_target: f64,

    /// Fraction of the nominal target used as the ceiling in deload weeks
    pub deload_target_factor: f64,
}

impl Default for StrainConfig {
    fn default() -> Self {
        StrainConfig {
            light_target: 8.0,
            moderate_target: 12.0,
            high_target: 16.0,
            deload_target_factor: 0.7,
        }
    }
}

impl StrainConfig {
    /// Strain ceiling for a given session intensity
    pub fn target_for(&self, intensity: Intensity) -> f64 {
        match intensity {
            Intensity::Light => self.light_target,
            Intensity::Moderate => self.moderate_target,
            Intensity::High => self.high_target,
        }
    }
}

/// Outcome of a strain-target check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrainStatus {
    /// Training should stop for the day
    pub should_stop: bool,

    /// Fraction of the ceiling already accumulated, clamped to [0, 1]
    pub progress: f64,

    /// Human-readable status line
    pub message: String,
}

/// Strain-target monitor
pub struct StrainMonitor {
    config: StrainConfig,
}

impl StrainMonitor {
    pub fn new() -> Self {
        Self::with_config(StrainConfig::default())
    }

    pub fn with_config(config: StrainConfig) -> Self {
        StrainMonitor { config }
    }

    pub fn config(&self) -> &StrainConfig {
        &self.config
    }

    /// Compare cumulative strain against the day's ceiling.
    ///
    /// During a deload week the ceiling drops to `deload_target_factor` of
    /// the nominal target, and progress is measured against that lowered
    /// ceiling. A missing or zero target yields progress 0 and no stop
    /// signal, so an unset target can never halt a session.
    pub fn check(&self, current_strain: f64, target_strain: f64, in_deload: bool) -> StrainStatus {
        if !target_strain.is_finite() || target_strain <= 0.0 {
            return StrainStatus {
                should_stop: false,
                progress: 0.0,
                message: "No strain target set for today".to_string(),
            };
        }

        let current = if current_strain.is_finite() {
            current_strain.max(0.0)
        } else {
            0.0
        };

        let factor = self.config.deload_target_factor;
        let effective_target = if in_deload && factor.is_finite() && factor > 0.0 {
            target_strain * factor
        } else {
            target_strain
        };

        let progress = (current / effective_target).clamp(0.0, 1.0);
        let should_stop = current >= effective_target;

        let message = if should_stop {
            format!(
                "Strain ceiling reached: {:.1} of {:.1}. Stop for today",
                current, effective_target
            )
        } else {
            format!(
                "Strain at {:.1} of {:.1} ({:.0}% of ceiling)",
                current,
                effective_target,
                progress * 100.0
            )
        };

        debug!(current, effective_target, progress, should_stop, "strain check");

        StrainStatus {
            should_stop,
            progress,
            message,
        }
    }
}

impl Default for StrainMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulate cumulative day strain from heart-rate samples.
///
/// Samples must be ordered by offset. Returns 0 when the heart-rate
/// reserve is degenerate (max not above resting) or no samples are given.
pub fn accumulate_strain(samples: &[StrainSample], max_hr: u16, resting_hr: u16) -> f64 {
    if samples.is_empty() || max_hr <= resting_hr {
        return 0.0;
    }

    let reserve = f64::from(max_hr) - f64::from(resting_hr);
    let mut trimp = 0.0;

    for (i, sample) in samples.iter().enumerate() {
        let gap_secs = match samples.get(i + 1) {
            Some(next) => next
                .offset_secs
                .saturating_sub(sample.offset_secs)
                .min(MAX_SAMPLE_GAP_SECS),
            // Last sample covers the same span as the one before it
            None => match samples.len() {
                1 => 1,
                n => samples[n - 1]
                    .offset_secs
                    .saturating_sub(samples[n - 2].offset_secs)
                    .min(MAX_SAMPLE_GAP_SECS),
            },
        };

        let weight = zone_weight(sample.heart_rate, resting_hr, reserve);
        trimp += f64::from(gap_secs) / 60.0 * f64::from(weight);
    }

    trimp_to_strain(trimp)
}

/// Edwards zone weight from percent heart-rate reserve:
/// below 50% scores 0, then one point per 10% band up to 5 at 90%+.
fn zone_weight(bpm: u16, resting_hr: u16, reserve: f64) -> u8 {
    let pct = (f64::from(bpm) - f64::from(resting_hr)) / reserve * 100.0;
    if pct < 50.0 {
        0
    } else if pct < 60.0 {
        1
    } else if pct < 70.0 {
        2
    } else if pct < 80.0 {
        3
    } else if pct < 90.0 {
        4
    } else {
        5
    }
}

fn trimp_to_strain(trimp: f64) -> f64 {
    if trimp <= 0.0 {
        return 0.0;
    }
    let raw = MAX_STRAIN * (trimp + 1.0).ln() / TRIMP_CEILING.ln();
    raw.min(MAX_STRAIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn steady_samples(bpm: u16, count: u32, step_secs: u32) -> Vec<StrainSample> {
        (0..count)
            .map(|i| StrainSample {
                offset_secs: i * step_secs,
                heart_rate: bpm,
            })
            .collect()
    }

    #[test]
    fn test_target_reached_stops() {
        let monitor = StrainMonitor::new();
        let status = monitor.check(15.0, 12.0, false);

        assert!(status.should_stop);
        assert_eq!(status.progress, 1.0);
        assert!(status.message.contains("Stop"));
    }

    #[test]
    fn test_below_target_continues() {
        let monitor = StrainMonitor::new();
        let status = monitor.check(6.0, 12.0, false);

        assert!(!status.should_stop);
        assert!((status.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_exact_target_stops() {
        let monitor = StrainMonitor::new();
        let status = monitor.check(12.0, 12.0, false);

        assert!(status.should_stop);
        assert_eq!(status.progress, 1.0);
    }

    #[test]
    fn test_zero_target_never_stops() {
        let monitor = StrainMonitor::new();
        let status = monitor.check(15.0, 0.0, false);

        assert!(!status.should_stop);
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn test_negative_and_nan_targets_never_stop() {
        let monitor = StrainMonitor::new();

        let status = monitor.check(15.0, -3.0, false);
        assert!(!status.should_stop);
        assert_eq!(status.progress, 0.0);

        let status = monitor.check(15.0, f64::NAN, false);
        assert!(!status.should_stop);
        assert_eq!(status.progress, 0.0);
    }

    #[test]
    fn test_deload_lowers_ceiling() {
        let monitor = StrainMonitor::new();

        // 9.0 is under the nominal 12.0 but over the deload ceiling of 8.4
        let normal = monitor.check(9.0, 12.0, false);
        assert!(!normal.should_stop);

        let deload = monitor.check(9.0, 12.0, true);
        assert!(deload.should_stop);
        assert_eq!(deload.progress, 1.0);
    }

    #[test]
    fn test_intensity_targets() {
        let config = StrainConfig::default();
        assert_eq!(config.target_for(Intensity::Light), 8.0);
        assert_eq!(config.target_for(Intensity::Moderate), 12.0);
        assert_eq!(config.target_for(Intensity::High), 16.0);
    }

    #[test]
    fn test_zone_weights_by_reserve() {
        // resting 60, max 190: reserve 130
        let reserve = 130.0;
        assert_eq!(zone_weight(100, 60, reserve), 0); // ~31% HRR
        assert_eq!(zone_weight(125, 60, reserve), 1); // 50% HRR
        assert_eq!(zone_weight(140, 60, reserve), 2); // ~62% HRR
        assert_eq!(zone_weight(155, 60, reserve), 3); // ~73% HRR
        assert_eq!(zone_weight(170, 60, reserve), 4); // ~85% HRR
        assert_eq!(zone_weight(180, 60, reserve), 5); // ~92% HRR
    }

    #[test]
    fn test_resting_heart_rate_accumulates_nothing() {
        let samples = steady_samples(60, 600, 6);
        let strain = accumulate_strain(&samples, 190, 60);
        assert_eq!(strain, 0.0);
    }

    #[test]
    fn test_hard_hour_scores_meaningful_strain() {
        // One hour at ~85% HRR in 6-second samples
        let samples = steady_samples(170, 600, 6);
        let strain = accumulate_strain(&samples, 190, 60);

        assert!(strain > 8.0, "strain was {}", strain);
        assert!(strain <= MAX_STRAIN);
    }

    #[test]
    fn test_longer_effort_scores_higher() {
        let one_hour = steady_samples(160, 600, 6);
        let two_hours = steady_samples(160, 1200, 6);

        let short = accumulate_strain(&one_hour, 190, 60);
        let long = accumulate_strain(&two_hours, 190, 60);
        assert!(long > short);
    }

    #[test]
    fn test_recording_gaps_are_clamped() {
        // Identical heart rates, but the second set has a huge dropout gap
        let contiguous = steady_samples(170, 10, 60);
        let mut gapped = steady_samples(170, 10, 60);
        for (i, s) in gapped.iter_mut().enumerate() {
            s.offset_secs = (i as u32) * 3600;
        }

        let base = accumulate_strain(&contiguous, 190, 60);
        let with_gaps = accumulate_strain(&gapped, 190, 60);

        // Gap clamping keeps the dropout from crediting 10 hours of work
        assert!(with_gaps < base * 20.0);
    }

    #[test]
    fn test_degenerate_reserve_returns_zero() {
        let samples = steady_samples(170, 100, 6);
        assert_eq!(accumulate_strain(&samples, 60, 60), 0.0);
        assert_eq!(accumulate_strain(&samples, 50, 60), 0.0);
        assert_eq!(accumulate_strain(&[], 190, 60), 0.0);
    }

    proptest! {
        #[test]
        fn prop_progress_clamped(
            current in -10.0f64..=50.0,
            target in 0.1f64..=21.0,
            deload in proptest::bool::ANY,
        ) {
            let monitor = StrainMonitor::new();
            let status = monitor.check(current, target, deload);

            prop_assert!(status.progress >= 0.0);
            prop_assert!(status.progress <= 1.0);
        }

        #[test]
        fn prop_progress_monotonic_in_strain(
            a in 0.0f64..=30.0,
            b in 0.0f64..=30.0,
            target in 0.1f64..=21.0,
        ) {
            let monitor = StrainMonitor::new();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

            let low = monitor.check(lo, target, false);
            let high = monitor.check(hi, target, false);
            prop_assert!(low.progress <= high.progress);
        }

        #[test]
        fn prop_stop_iff_ceiling_met(
            current in 0.0f64..=30.0,
            target in 0.1f64..=21.0,
        ) {
            let monitor = StrainMonitor::new();
            let status = monitor.check(current, target, false);
            prop_assert_eq!(status.should_stop, current >= target);
        }

        #[test]
        fn prop_accumulated_strain_in_scale(
            bpm in 40u16..=200,
            count in 1u32..=2000,
        ) {
            let samples = steady_samples(bpm, count, 6);
            let strain = accumulate_strain(&samples, 195, 55);

            prop_assert!(strain >= 0.0);
            prop_assert!(strain <= MAX_STRAIN);
        }
    }
}
