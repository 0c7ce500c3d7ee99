//! Progression evaluation
//!
//! Decides whether an exercise has earned a load or rep increase by looking
//! at a short window of session history. Progression requires demonstrated
//! readiness on two axes: the athlete consistently completed the planned
//! reps, and perceived effort trended downward (the same work is getting
//! easier). A declining recovery trend vetoes the increase.
//!
//! Missing data always resolves conservatively: short histories and absent
//! effort ratings hold the current parameters, and malformed records are
//! skipped rather than surfaced as errors.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use crate::models::{ProgressionDecision, ProgressionSession, TrainingParameters};

/// Tunables for the progression rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// How many days of history to consider
    pub lookback_days: i64,

    /// Minimum usable sessions before progression is considered
    pub min_sessions: usize,

    /// Fraction of sessions that must meet or exceed the plan
    pub completion_threshold: f64,

    /// Effort slope (RPE per day) must be at or below this to progress
    pub effort_slope_max: f64,

    /// Recovery slope (points per day) below this vetoes progression
    pub recovery_decline_limit: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        ProgressionConfig {
            lookback_days: 14,
            min_sessions: 3,
            completion_threshold: 0.8,
            effort_slope_max: 0.0,
            recovery_decline_limit: -2.0,
        }
    }
}

/// Progression evaluator
pub struct ProgressionEvaluator {
    config: ProgressionConfig,
}

impl ProgressionEvaluator {
    pub fn new() -> Self {
        Self::with_config(ProgressionConfig::default())
    }

    pub fn with_config(config: ProgressionConfig) -> Self {
        ProgressionEvaluator { config }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Evaluate whether `exercise` is ready to progress as of `as_of`.
    ///
    /// `current` is the prescription the caller would progress from; if it
    /// fails its own invariants the answer is always "hold". History records
    /// outside the lookback window, for other exercises, or malformed are
    /// ignored.
    pub fn evaluate(
        &self,
        exercise: &str,
        current: &TrainingParameters,
        history: &[ProgressionSession],
        as_of: NaiveDate,
    ) -> ProgressionDecision {
        if let Err(e) = current.validate() {
            return ProgressionDecision {
                should_progress: false,
                reasoning: format!("Holding: current parameters are unusable ({})", e),
            };
        }

        let window_start = as_of - Duration::days(self.config.lookback_days);
        let mut skipped = 0usize;

        let mut sessions: Vec<&ProgressionSession> = history
            .iter()
            .filter(|s| s.exercise.eq_ignore_ascii_case(exercise))
            .filter(|s| s.date > window_start && s.date <= as_of)
            .filter(|s| {
                if s.is_well_formed() {
                    true
                } else {
                    skipped += 1;
                    false
                }
            })
            .collect();

        if skipped > 0 {
            warn!(exercise, skipped, "skipped malformed session records");
        }

        if sessions.len() < self.config.min_sessions {
            return ProgressionDecision {
                should_progress: false,
                reasoning: format!(
                    "Holding: only {} usable {} session(s) in the last {} days; need {}",
                    sessions.len(),
                    exercise,
                    self.config.lookback_days,
                    self.config.min_sessions
                ),
            };
        }

        sessions.sort_by_key(|s| s.date);
        let first_date = sessions[0].date;

        // Axis 1: completion. completion_ratio() is Some for every
        // well-formed record.
        let ratios: Vec<f64> = sessions
            .iter()
            .filter_map(|s| s.completion_ratio())
            .collect();
        let sessions_met = ratios.iter().filter(|&&r| r >= 1.0).count();
        let met_fraction = sessions_met as f64 / sessions.len() as f64;
        let mean_completion = ratios.iter().mean();

        if met_fraction < self.config.completion_threshold {
            return ProgressionDecision {
                should_progress: false,
                reasoning: format!(
                    "Holding: plan completed in {} of {} sessions (avg completion {:.0}%); \
                     need {:.0}% of sessions at or above plan",
                    sessions_met,
                    sessions.len(),
                    mean_completion * 100.0,
                    self.config.completion_threshold * 100.0
                ),
            };
        }

        // Axis 2: effort easing. Without at least two RPE readings the
        // easing cannot be confirmed, so hold.
        let effort_points: Vec<(f64, f64)> = sessions
            .iter()
            .filter_map(|s| {
                s.perceived_effort
                    .map(|e| (day_offset(first_date, s.date), e))
            })
            .collect();

        let effort_slope = match trend_slope(&effort_points) {
            Some(slope) => slope,
            None => {
                return ProgressionDecision {
                    should_progress: false,
                    reasoning: "Holding: not enough effort ratings to confirm sessions are \
                                getting easier"
                        .to_string(),
                };
            }
        };

        if effort_slope > self.config.effort_slope_max {
            return ProgressionDecision {
                should_progress: false,
                reasoning: format!(
                    "Holding: perceived effort is rising ({:+.2} RPE/day) despite completed plans",
                    effort_slope
                ),
            };
        }

        // Veto: recovery falling fast. Missing recovery data does not veto.
        let recovery_points: Vec<(f64, f64)> = sessions
            .iter()
            .filter_map(|s| {
                s.recovery_before
                    .map(|r| (day_offset(first_date, s.date), r))
            })
            .collect();

        if let Some(recovery_slope) = trend_slope(&recovery_points) {
            if recovery_slope < self.config.recovery_decline_limit {
                return ProgressionDecision {
                    should_progress: false,
                    reasoning: format!(
                        "Holding: recovery is declining ({:+.1} points/day); consolidate first",
                        recovery_slope
                    ),
                };
            }
        }

        debug!(
            exercise,
            sessions = sessions.len(),
            met_fraction,
            effort_slope,
            "progression criteria met"
        );

        ProgressionDecision {
            should_progress: true,
            reasoning: format!(
                "Progress: plan met in {} of {} sessions and effort trending down \
                 ({:+.2} RPE/day)",
                sessions_met,
                sessions.len(),
                effort_slope
            ),
        }
    }
}

impl Default for ProgressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn day_offset(first: NaiveDate, date: NaiveDate) -> f64 {
    (date - first).num_days() as f64
}

/// Least-squares slope of y over x. Needs two distinct x positions.
fn trend_slope(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();

    let x_variance = xs.iter().variance();
    if !x_variance.is_finite() || x_variance < f64::EPSILON {
        return None;
    }
    let covariance = xs.iter().covariance(ys.iter());
    Some(covariance / x_variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn session(
        day: u32,
        completed: Vec<u32>,
        effort: Option<f64>,
        recovery: Option<f64>,
    ) -> ProgressionSession {
        let planned = TrainingParameters::new(dec!(70), 8, 3);
        let mut s = ProgressionSession::new("bench press", date(day), planned);
        s.completed_reps = completed;
        s.perceived_effort = effort;
        s.recovery_before = recovery;
        s
    }

    fn full_sets() -> Vec<u32> {
        vec![8, 8, 8]
    }

    #[test]
    fn test_progresses_on_completion_and_easing_effort() {
        let history = vec![
            session(1, full_sets(), Some(8.0), Some(60.0)),
            session(4, full_sets(), Some(7.0), Some(62.0)),
            session(8, full_sets(), Some(6.0), Some(65.0)),
            session(11, full_sets(), Some(5.5), Some(66.0)),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(decision.should_progress, "{}", decision.reasoning);
        assert!(decision.reasoning.contains("Progress"));
    }

    #[test]
    fn test_short_history_holds() {
        let history = vec![
            session(10, full_sets(), Some(6.0), None),
            session(12, full_sets(), Some(5.0), None),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("need 3"));
    }

    #[test]
    fn test_empty_history_holds() {
        let evaluator = ProgressionEvaluator::new();
        let decision =
            evaluator.evaluate("bench press", &TrainingParameters::default(), &[], date(14));

        assert!(!decision.should_progress);
    }

    #[test]
    fn test_incomplete_sessions_hold() {
        let history = vec![
            session(2, vec![8, 6, 5], Some(8.0), None),
            session(6, vec![8, 7, 5], Some(8.0), None),
            session(10, vec![8, 8, 8], Some(7.5), None),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("1 of 3"));
    }

    #[test]
    fn test_rising_effort_holds() {
        let history = vec![
            session(1, full_sets(), Some(6.0), None),
            session(5, full_sets(), Some(7.0), None),
            session(9, full_sets(), Some(8.5), None),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("effort is rising"));
    }

    #[test]
    fn test_missing_effort_data_holds() {
        let history = vec![
            session(1, full_sets(), None, None),
            session(5, full_sets(), None, None),
            session(9, full_sets(), Some(6.0), None),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("effort ratings"));
    }

    #[test]
    fn test_declining_recovery_vetoes() {
        let history = vec![
            session(1, full_sets(), Some(7.0), Some(80.0)),
            session(5, full_sets(), Some(6.5), Some(62.0)),
            session(9, full_sets(), Some(6.0), Some(45.0)),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("recovery is declining"));
    }

    #[test]
    fn test_malformed_records_skipped_not_thrown() {
        // Two good records plus garbage: no reps, absurd RPE
        let mut no_reps = session(3, vec![], Some(6.0), None);
        no_reps.completed_reps = Vec::new();
        let bad_rpe = session(5, full_sets(), Some(42.0), None);

        let history = vec![
            session(1, full_sets(), Some(7.0), None),
            no_reps,
            bad_rpe,
            session(9, full_sets(), Some(6.0), None),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        // Two usable sessions is below the minimum; the garbage was skipped
        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("2 usable"));
    }

    #[test]
    fn test_other_exercises_ignored() {
        let mut other = session(2, full_sets(), Some(5.0), None);
        other.exercise = "overhead press".to_string();

        let history = vec![
            other,
            session(4, full_sets(), Some(6.0), None),
            session(8, full_sets(), Some(5.5), None),
        ];

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("2 usable"));
    }

    #[test]
    fn test_old_sessions_outside_window_ignored() {
        let history = vec![
            session(1, full_sets(), Some(7.0), None),
            session(3, full_sets(), Some(6.5), None),
            session(5, full_sets(), Some(6.0), None),
        ];

        let evaluator = ProgressionEvaluator::new();
        // A month later the window is empty
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            NaiveDate::from_ymd_opt(2024, 7, 30).unwrap(),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("0 usable"));
    }

    #[test]
    fn test_invalid_current_parameters_hold() {
        let history = vec![
            session(1, full_sets(), Some(7.0), None),
            session(5, full_sets(), Some(6.5), None),
            session(9, full_sets(), Some(6.0), None),
        ];

        let mut bad = TrainingParameters::default();
        bad.reps = 0;

        let evaluator = ProgressionEvaluator::new();
        let decision = evaluator.evaluate("bench press", &bad, &history, date(14));

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("unusable"));
    }

    #[test]
    fn test_trend_slope() {
        let falling = vec![(0.0, 8.0), (3.0, 7.0), (6.0, 6.0)];
        let slope = trend_slope(&falling).unwrap();
        assert!(slope < 0.0);

        let flat = vec![(0.0, 7.0), (3.0, 7.0), (6.0, 7.0)];
        let slope = trend_slope(&flat).unwrap();
        assert!(slope.abs() < 1e-9);

        // Same-day points have no x spread
        let degenerate = vec![(0.0, 7.0), (0.0, 5.0)];
        assert_eq!(trend_slope(&degenerate), None);

        assert_eq!(trend_slope(&[(0.0, 7.0)]), None);
    }

    #[test]
    fn test_custom_config_min_sessions() {
        let config = ProgressionConfig {
            min_sessions: 5,
            ..Default::default()
        };
        let history = vec![
            session(1, full_sets(), Some(7.0), None),
            session(4, full_sets(), Some(6.5), None),
            session(8, full_sets(), Some(6.0), None),
            session(11, full_sets(), Some(5.5), None),
        ];

        let evaluator = ProgressionEvaluator::with_config(config);
        let decision = evaluator.evaluate(
            "bench press",
            &TrainingParameters::default(),
            &history,
            date(14),
        );

        assert!(!decision.should_progress);
        assert!(decision.reasoning.contains("need 5"));
    }
}
