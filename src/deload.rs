//! Deload detection and the training-phase state machine
//!
//! A deload week triggers when recent days show sustained fatigue: enough
//! days with elevated strain or depressed recovery, or too much cumulative
//! strain across the window. The phase is an explicit tagged state so
//! "are we deloading, and since when" is never implicit: entry comes from
//! the detector, exit is duration-based and configurable.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{DailyMetrics, Intensity, TrainingParameters};

/// Tunables for deload detection and the deload week itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeloadConfig {
    /// How many days of metrics to examine
    pub lookback_days: i64,

    /// Fatigued days within the window required to trigger
    pub trigger_days: usize,

    /// Day strain at or above this marks the day fatigued
    pub high_strain: f64,

    /// Recovery at or below this marks the day fatigued
    pub low_recovery: f64,

    /// Cumulative window strain that triggers on its own
    pub cumulative_strain_ceiling: f64,

    /// Length of a deload week in days
    pub duration_days: i64,

    /// Fixed rest prescription during deload, in seconds
    pub rest_seconds: u32,
}

impl Default for DeloadConfig {
    fn default() -> Self {
        DeloadConfig {
            lookback_days: 7,
            trigger_days: 5,
            high_strain: 14.0,
            low_recovery: 40.0,
            cumulative_strain_ceiling: 90.0,
            duration_days: 7,
            rest_seconds: 90,
        }
    }
}

/// Explicit training phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum TrainingPhase {
    /// Regular training
    Normal,
    /// Deload week in progress
    Deload { started_on: NaiveDate },
}

impl TrainingPhase {
    pub fn is_deload(&self) -> bool {
        matches!(self, TrainingPhase::Deload { .. })
    }

    pub fn started_on(&self) -> Option<NaiveDate> {
        match self {
            TrainingPhase::Normal => None,
            TrainingPhase::Deload { started_on } => Some(*started_on),
        }
    }
}

impl Default for TrainingPhase {
    fn default() -> Self {
        TrainingPhase::Normal
    }
}

/// What the detector concluded and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeloadAssessment {
    /// A deload week should begin
    pub should_deload: bool,

    /// Explanation when triggering, or why not
    pub reason: String,

    /// Fatigued days counted in the window
    pub fatigued_days: usize,

    /// Total strain across the window
    pub cumulative_strain: f64,
}

/// Deload detector
pub struct DeloadDetector {
    config: DeloadConfig,
}

impl DeloadDetector {
    pub fn new() -> Self {
        Self::with_config(DeloadConfig::default())
    }

    pub fn with_config(config: DeloadConfig) -> Self {
        DeloadDetector { config }
    }

    pub fn config(&self) -> &DeloadConfig {
        &self.config
    }

    /// Assess whether a deload week should begin.
    ///
    /// Only metrics within the lookback window ending at `as_of` count.
    /// While already in a deload week the answer is always no: the week
    /// runs its configured course instead of re-triggering.
    pub fn assess(
        &self,
        recent: &[DailyMetrics],
        phase: &TrainingPhase,
        as_of: NaiveDate,
    ) -> DeloadAssessment {
        let window_start = as_of - Duration::days(self.config.lookback_days);

        let in_window: Vec<&DailyMetrics> = recent
            .iter()
            .filter(|m| m.date > window_start && m.date <= as_of)
            .collect();

        let fatigued_days = in_window.iter().filter(|m| self.is_fatigued(m)).count();
        let cumulative_strain: f64 = in_window
            .iter()
            .filter_map(|m| m.strain)
            .filter(|s| s.is_finite())
            .sum();

        if phase.is_deload() {
            return DeloadAssessment {
                should_deload: false,
                reason: "Already in a deload week".to_string(),
                fatigued_days,
                cumulative_strain,
            };
        }

        let by_days = fatigued_days >= self.config.trigger_days;
        let by_cumulative = cumulative_strain >= self.config.cumulative_strain_ceiling;

        debug!(
            fatigued_days,
            cumulative_strain, by_days, by_cumulative, "deload assessment"
        );

        if by_days {
            DeloadAssessment {
                should_deload: true,
                reason: format!(
                    "{} of the last {} days showed high strain or low recovery",
                    fatigued_days, self.config.lookback_days
                ),
                fatigued_days,
                cumulative_strain,
            }
        } else if by_cumulative {
            DeloadAssessment {
                should_deload: true,
                reason: format!(
                    "Cumulative strain {:.1} over {} days exceeds the {:.0} ceiling",
                    cumulative_strain, self.config.lookback_days, self.config.cumulative_strain_ceiling
                ),
                fatigued_days,
                cumulative_strain,
            }
        } else {
            DeloadAssessment {
                should_deload: false,
                reason: format!(
                    "Fatigue signals within limits ({} flagged days, {:.1} cumulative strain)",
                    fatigued_days, cumulative_strain
                ),
                fatigued_days,
                cumulative_strain,
            }
        }
    }

    fn is_fatigued(&self, metrics: &DailyMetrics) -> bool {
        let high_strain = metrics
            .strain
            .filter(|s| s.is_finite())
            .map_or(false, |s| s >= self.config.high_strain);
        let low_recovery = metrics
            .recovery_score
            .filter(|r| r.is_finite())
            .map_or(false, |r| r <= self.config.low_recovery);
        high_strain || low_recovery
    }

    /// Build the prescription for a deload week: load halved, reps doubled,
    /// rest fixed, intensity forced light.
    pub fn deload_parameters(&self, baseline: &TrainingParameters) -> TrainingParameters {
        TrainingParameters {
            load: baseline.load / rust_decimal::Decimal::from(2),
            reps: baseline.reps.saturating_mul(2),
            sets: baseline.sets,
            rest_between_sets: self.config.rest_seconds,
            rest_between_exercises: self.config.rest_seconds,
            intensity: Intensity::Light,
            is_deload_week: true,
        }
    }

    /// Enter a deload week starting today
    pub fn start_deload(&self, today: NaiveDate) -> TrainingPhase {
        info!(%today, "starting deload week");
        TrainingPhase::Deload { started_on: today }
    }

    /// Advance the phase by the duration rule: a deload week ends once
    /// `duration_days` have elapsed since it started.
    pub fn advance_phase(&self, phase: TrainingPhase, today: NaiveDate) -> TrainingPhase {
        match phase {
            TrainingPhase::Normal => TrainingPhase::Normal,
            TrainingPhase::Deload { started_on } => {
                if today - started_on >= Duration::days(self.config.duration_days) {
                    info!(%started_on, %today, "deload week complete");
                    TrainingPhase::Normal
                } else {
                    phase
                }
            }
        }
    }
}

impl Default for DeloadDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn day_metrics(day: u32, recovery: f64, strain: f64) -> DailyMetrics {
        DailyMetrics {
            date: date(day),
            recovery_score: Some(recovery),
            strain: Some(strain),
            hrv_rmssd: None,
            sleep_performance: None,
            resting_heart_rate: None,
        }
    }

    #[test]
    fn test_sustained_fatigue_triggers() {
        let recent: Vec<DailyMetrics> = (8..=13)
            .map(|d| day_metrics(d, 35.0, 15.0))
            .collect();

        let detector = DeloadDetector::new();
        let assessment = detector.assess(&recent, &TrainingPhase::Normal, date(14));

        assert!(assessment.should_deload);
        assert!(assessment.fatigued_days >= 5);
        assert!(assessment.reason.contains("high strain or low recovery"));
    }

    #[test]
    fn test_few_fatigued_days_does_not_trigger() {
        let recent = vec![
            day_metrics(10, 70.0, 9.0),
            day_metrics(11, 35.0, 15.0),
            day_metrics(12, 72.0, 8.0),
            day_metrics(13, 38.0, 16.0),
        ];

        let detector = DeloadDetector::new();
        let assessment = detector.assess(&recent, &TrainingPhase::Normal, date(14));

        assert!(!assessment.should_deload);
        assert_eq!(assessment.fatigued_days, 2);
    }

    #[test]
    fn test_cumulative_strain_triggers_alone() {
        // Recovery fine every day, but strain piles up past the ceiling
        let recent: Vec<DailyMetrics> = (8..=14)
            .map(|d| day_metrics(d, 70.0, 13.5))
            .collect();

        let detector = DeloadDetector::new();
        let assessment = detector.assess(&recent, &TrainingPhase::Normal, date(14));

        assert!(assessment.should_deload);
        assert!(assessment.reason.contains("Cumulative strain"));
    }

    #[test]
    fn test_no_retrigger_during_deload() {
        let recent: Vec<DailyMetrics> = (8..=13)
            .map(|d| day_metrics(d, 30.0, 16.0))
            .collect();

        let detector = DeloadDetector::new();
        let phase = TrainingPhase::Deload {
            started_on: date(10),
        };
        let assessment = detector.assess(&recent, &phase, date(14));

        assert!(!assessment.should_deload);
        assert!(assessment.reason.contains("Already"));
    }

    #[test]
    fn test_old_metrics_outside_window_ignored() {
        let recent: Vec<DailyMetrics> = (1..=6)
            .map(|d| day_metrics(d, 30.0, 16.0))
            .collect();

        let detector = DeloadDetector::new();
        let assessment = detector.assess(&recent, &TrainingPhase::Normal, date(20));

        assert!(!assessment.should_deload);
        assert_eq!(assessment.fatigued_days, 0);
    }

    #[test]
    fn test_deload_parameters_identities() {
        let baseline = TrainingParameters {
            load: dec!(80),
            reps: 6,
            sets: 4,
            rest_between_sets: 150,
            rest_between_exercises: 240,
            intensity: Intensity::High,
            is_deload_week: false,
        };

        let detector = DeloadDetector::new();
        let deload = detector.deload_parameters(&baseline);

        assert_eq!(deload.load, dec!(40));
        assert_eq!(deload.reps, 12);
        assert_eq!(deload.sets, 4);
        assert_eq!(deload.rest_between_sets, 90);
        assert_eq!(deload.rest_between_exercises, 90);
        assert_eq!(deload.intensity, Intensity::Light);
        assert!(deload.is_deload_week);
    }

    #[test]
    fn test_phase_advances_out_of_deload_after_duration() {
        let detector = DeloadDetector::new();
        let phase = detector.start_deload(date(1));
        assert!(phase.is_deload());

        // Day 6: still inside the week
        let phase = detector.advance_phase(phase, date(7));
        assert!(phase.is_deload());

        // Day 8: seven full days elapsed
        let phase = detector.advance_phase(phase, date(8));
        assert_eq!(phase, TrainingPhase::Normal);
    }

    #[test]
    fn test_normal_phase_stays_normal() {
        let detector = DeloadDetector::new();
        let phase = detector.advance_phase(TrainingPhase::Normal, date(20));
        assert_eq!(phase, TrainingPhase::Normal);
    }

    #[test]
    fn test_custom_duration() {
        let config = DeloadConfig {
            duration_days: 4,
            ..Default::default()
        };
        let detector = DeloadDetector::with_config(config);
        let phase = detector.start_deload(date(1));

        assert!(detector.advance_phase(phase, date(4)).is_deload());
        assert_eq!(detector.advance_phase(phase, date(5)), TrainingPhase::Normal);
    }

    #[test]
    fn test_phase_serialization() {
        let phase = TrainingPhase::Deload {
            started_on: date(10),
        };
        let json = serde_json::to_string(&phase).unwrap();
        assert!(json.contains("\"phase\":\"deload\""));

        let back: TrainingPhase = serde_json::from_str(&json).unwrap();
        assert_eq!(back, phase);

        let normal = serde_json::to_string(&TrainingPhase::Normal).unwrap();
        assert!(normal.contains("\"phase\":\"normal\""));
    }

    proptest! {
        #[test]
        fn prop_deload_parameter_identities(
            load in 20u32..=120,
            reps in 1u32..=15,
            sets in 1u32..=8,
            rest in 30u32..=300,
        ) {
            let baseline = TrainingParameters {
                load: rust_decimal::Decimal::from(load),
                reps,
                sets,
                rest_between_sets: rest,
                rest_between_exercises: rest * 2,
                intensity: Intensity::Moderate,
                is_deload_week: false,
            };

            let detector = DeloadDetector::new();
            let deload = detector.deload_parameters(&baseline);

            prop_assert_eq!(deload.load, baseline.load / rust_decimal::Decimal::from(2));
            prop_assert_eq!(deload.reps, baseline.reps * 2);
            prop_assert_eq!(deload.rest_between_sets, 90);
            prop_assert!(deload.is_deload_week);
        }
    }
}
