//! Rest-period adjustment
//!
//! Scales the rest fields of a prescription by the multiplier from a daily
//! recommendation. Load, reps and sets pass through untouched; progression
//! owns those. Pure function, no I/O.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::models::{InjuryRisk, Intensity, TrainingParameters};

/// Rest multipliers per recommended intensity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestMultipliers {
    /// Multiplier for light days
    pub light: f64,

    /// Multiplier for moderate days
    pub moderate: f64,

    /// Multiplier for high-intensity days
    pub high: f64,

    /// Minimum multiplier whenever injury risk is high
    pub high_risk_floor: f64,
}

impl Default for RestMultipliers {
    fn default() -> Self {
        RestMultipliers {
            light: 1.5,
            moderate: 1.2,
            high: 1.0,
            high_risk_floor: 1.5,
        }
    }
}

impl RestMultipliers {
    /// Pick the multiplier for a classification outcome
    pub fn multiplier_for(&self, intensity: Intensity, risk: InjuryRisk) -> f64 {
        let base = match intensity {
            Intensity::Light => self.light,
            Intensity::Moderate => self.moderate,
            Intensity::High => self.high,
        };
        if risk == InjuryRisk::High {
            base.max(self.high_risk_floor)
        } else {
            base
        }
    }
}

/// Apply a rest multiplier to baseline parameters.
///
/// Both rest fields are scaled and rounded to the nearest whole second.
/// A multiplier of exactly 1.0 returns the baseline values unchanged.
/// Negative multipliers clamp to zero rest; non-finite multipliers are
/// treated as 1.0 so a bad upstream value never corrupts the plan.
pub fn adjust_rest_periods(
    baseline: &TrainingParameters,
    rest_multiplier: f64,
) -> TrainingParameters {
    let multiplier = if rest_multiplier.is_finite() {
        rest_multiplier.max(0.0)
    } else {
        1.0
    };

    let adjusted = TrainingParameters {
        rest_between_sets: scale_seconds(baseline.rest_between_sets, multiplier),
        rest_between_exercises: scale_seconds(baseline.rest_between_exercises, multiplier),
        ..baseline.clone()
    };

    trace!(
        multiplier,
        rest_between_sets = adjusted.rest_between_sets,
        rest_between_exercises = adjusted.rest_between_exercises,
        "adjusted rest periods"
    );

    adjusted
}

fn scale_seconds(seconds: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(seconds) * multiplier).round();
    if scaled < 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn baseline() -> TrainingParameters {
        TrainingParameters {
            rest_between_sets: 90,
            rest_between_exercises: 180,
            ..Default::default()
        }
    }

    #[test]
    fn test_multiplier_selection() {
        let multipliers = RestMultipliers::default();

        assert_eq!(
            multipliers.multiplier_for(Intensity::High, InjuryRisk::Low),
            1.0
        );
        assert_eq!(
            multipliers.multiplier_for(Intensity::Moderate, InjuryRisk::Moderate),
            1.2
        );
        assert_eq!(
            multipliers.multiplier_for(Intensity::Light, InjuryRisk::Low),
            1.5
        );

        // High risk floors the multiplier regardless of intensity
        assert_eq!(
            multipliers.multiplier_for(Intensity::High, InjuryRisk::High),
            1.5
        );
    }

    #[test]
    fn test_multiplier_scales_both_rest_fields() {
        let adjusted = adjust_rest_periods(&baseline(), 1.5);
        assert_eq!(adjusted.rest_between_sets, 135);
        assert_eq!(adjusted.rest_between_exercises, 270);
    }

    #[test]
    fn test_identity_multiplier_returns_baseline() {
        let base = baseline();
        let adjusted = adjust_rest_periods(&base, 1.0);
        assert_eq!(adjusted, base);
    }

    #[test]
    fn test_rounds_to_nearest_second() {
        let base = TrainingParameters {
            rest_between_sets: 100,
            rest_between_exercises: 100,
            ..Default::default()
        };

        // 100 * 1.333 = 133.3 rounds down, 100 * 1.335 = 133.5 rounds up
        let adjusted = adjust_rest_periods(&base, 1.333);
        assert_eq!(adjusted.rest_between_sets, 133);

        let adjusted = adjust_rest_periods(&base, 1.335);
        assert_eq!(adjusted.rest_between_sets, 134);
    }

    #[test]
    fn test_progression_fields_untouched() {
        let base = TrainingParameters {
            load: dec!(82.5),
            reps: 5,
            sets: 4,
            ..baseline()
        };
        let adjusted = adjust_rest_periods(&base, 2.0);

        assert_eq!(adjusted.load, dec!(82.5));
        assert_eq!(adjusted.reps, 5);
        assert_eq!(adjusted.sets, 4);
        assert_eq!(adjusted.intensity, base.intensity);
        assert_eq!(adjusted.is_deload_week, base.is_deload_week);
    }

    #[test]
    fn test_negative_multiplier_clamps_to_zero() {
        let adjusted = adjust_rest_periods(&baseline(), -2.0);
        assert_eq!(adjusted.rest_between_sets, 0);
        assert_eq!(adjusted.rest_between_exercises, 0);
    }

    #[test]
    fn test_non_finite_multiplier_treated_as_identity() {
        let base = baseline();

        let adjusted = adjust_rest_periods(&base, f64::NAN);
        assert_eq!(adjusted, base);

        let adjusted = adjust_rest_periods(&base, f64::INFINITY);
        assert_eq!(adjusted, base);
    }

    proptest! {
        #[test]
        fn prop_rest_never_negative(
            rest_sets in 0u32..=3600,
            rest_exercises in 0u32..=3600,
            multiplier in -5.0f64..=5.0,
        ) {
            let base = TrainingParameters {
                rest_between_sets: rest_sets,
                rest_between_exercises: rest_exercises,
                ..Default::default()
            };
            let adjusted = adjust_rest_periods(&base, multiplier);

            // u32 already enforces non-negative; check the scaling stayed sane
            prop_assert!(f64::from(adjusted.rest_between_sets)
                <= f64::from(rest_sets) * multiplier.max(0.0) + 0.5);
        }

        #[test]
        fn prop_identity_multiplier_is_idempotent(
            rest_sets in 0u32..=3600,
            rest_exercises in 0u32..=3600,
        ) {
            let base = TrainingParameters {
                rest_between_sets: rest_sets,
                rest_between_exercises: rest_exercises,
                ..Default::default()
            };
            let adjusted = adjust_rest_periods(&base, 1.0);

            prop_assert_eq!(adjusted.rest_between_sets, rest_sets);
            prop_assert_eq!(adjusted.rest_between_exercises, rest_exercises);
        }

        #[test]
        fn prop_monotonic_in_multiplier(
            rest in 1u32..=3600,
            m1 in 0.0f64..=4.0,
            m2 in 0.0f64..=4.0,
        ) {
            let base = TrainingParameters {
                rest_between_sets: rest,
                rest_between_exercises: rest,
                ..Default::default()
            };
            let (lo, hi) = if m1 <= m2 { (m1, m2) } else { (m2, m1) };

            let low = adjust_rest_periods(&base, lo);
            let high = adjust_rest_periods(&base, hi);
            prop_assert!(low.rest_between_sets <= high.rest_between_sets);
        }
    }
}
