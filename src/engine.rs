//! Recommendation engine
//!
//! Front door for the adaptive-training logic: feeds one day of metrics
//! through the classifier, picks the rest multiplier and strain target,
//! runs the deload detector, and assembles the full daily recommendation
//! with reasoning, health alerts and a confidence score. Also owns the
//! safety limits that clamp any proposed parameter change.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::baseline::HrvBaseline;
use crate::classifier::{Classifier, ClassifierThresholds};
use crate::deload::{DeloadAssessment, DeloadConfig, DeloadDetector, TrainingPhase};
use crate::models::{
    AlertSeverity, DailyMetrics, DailyRecommendation, ExperienceLevel, HealthAlert, InjuryRisk,
    Intensity, ProgressionDecision, ProgressionSession, TrainingParameters,
};
use crate::progression::{ProgressionConfig, ProgressionEvaluator};
use crate::rest::{self, RestMultipliers};
use crate::strain::{StrainConfig, StrainMonitor, StrainStatus};

/// Load-reduction advice per intensity, in percent
const LIGHT_LOAD_REDUCTION: f64 = 20.0;
const MODERATE_LOAD_REDUCTION: f64 = 10.0;

/// Hard floors and ceilings on proposed parameter changes.
///
/// These guard against any single adjustment step being too aggressive,
/// whatever produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    /// Largest allowed load increase per step, in percent of current load
    pub max_load_increase_percent: f64,

    /// Reps may not drop below this fraction of the current prescription
    pub min_rep_fraction: f64,

    /// Rest periods may not drop below this many seconds
    pub min_rest_seconds: u32,
}

impl Default for SafetyLimits {
    fn default() -> Self {
        SafetyLimits {
            max_load_increase_percent: 10.0,
            min_rep_fraction: 0.8,
            min_rest_seconds: 30,
        }
    }
}

impl SafetyLimits {
    /// Clamp a proposed prescription against the current one.
    ///
    /// Returns the clamped parameters and a note for every limit that
    /// fired. Decreases in load are never clamped; deloads depend on them.
    pub fn apply(
        &self,
        current: &TrainingParameters,
        proposed: TrainingParameters,
    ) -> (TrainingParameters, Vec<String>) {
        let mut clamped = proposed;
        let mut notes = Vec::new();

        let max_increase = Decimal::from_f64(self.max_load_increase_percent.max(0.0))
            .unwrap_or(Decimal::TEN);
        let load_cap = current.load * (Decimal::ONE + max_increase / Decimal::ONE_HUNDRED);
        if clamped.load > load_cap {
            notes.push(format!(
                "Load increase capped at {}% per step ({} -> {})",
                self.max_load_increase_percent, current.load, load_cap
            ));
            clamped.load = load_cap;
        }

        let rep_floor =
            ((f64::from(current.reps) * self.min_rep_fraction).ceil() as u32).max(1);
        if clamped.reps < rep_floor {
            notes.push(format!(
                "Reps floored at {}% of current plan ({} -> {})",
                self.min_rep_fraction * 100.0,
                clamped.reps,
                rep_floor
            ));
            clamped.reps = rep_floor;
        }

        if clamped.rest_between_sets < self.min_rest_seconds {
            notes.push(format!(
                "Rest between sets floored at {} s",
                self.min_rest_seconds
            ));
            clamped.rest_between_sets = self.min_rest_seconds;
        }
        if clamped.rest_between_exercises < self.min_rest_seconds {
            notes.push(format!(
                "Rest between exercises floored at {} s",
                self.min_rest_seconds
            ));
            clamped.rest_between_exercises = self.min_rest_seconds;
        }

        (clamped, notes)
    }
}

/// All engine tunables in one place
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub thresholds: ClassifierThresholds,
    pub rest: RestMultipliers,
    pub strain: StrainConfig,
    pub deload: DeloadConfig,
    pub progression: ProgressionConfig,
    pub safety: SafetyLimits,
}

/// Adaptive-training recommendation engine
pub struct AdaptiveEngine {
    classifier: Classifier,
    monitor: StrainMonitor,
    detector: DeloadDetector,
    evaluator: ProgressionEvaluator,
    rest: RestMultipliers,
    safety: SafetyLimits,
}

impl AdaptiveEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        AdaptiveEngine {
            classifier: Classifier::with_thresholds(config.thresholds),
            monitor: StrainMonitor::with_config(config.strain),
            detector: DeloadDetector::with_config(config.deload),
            evaluator: ProgressionEvaluator::with_config(config.progression),
            rest: config.rest,
            safety: config.safety,
        }
    }

    /// Produce the daily recommendation for one day of metrics.
    ///
    /// `recent` is the trailing metric history used by the deload detector
    /// (it may include `metrics` itself). `prior_day_strain` caps a green
    /// day; `baseline` enables the HRV rules.
    pub fn recommend(
        &self,
        metrics: &DailyMetrics,
        prior_day_strain: Option<f64>,
        recent: &[DailyMetrics],
        phase: &TrainingPhase,
        baseline: Option<&HrvBaseline>,
    ) -> DailyRecommendation {
        let classification = self.classifier.classify(metrics, prior_day_strain, baseline);

        let rest_multiplier = self
            .rest
            .multiplier_for(classification.intensity, classification.injury_risk);
        let target_strain = self.monitor.config().target_for(classification.intensity);

        let assessment = self.detector.assess(recent, phase, metrics.date);
        let mut reasoning = classification.reasoning.clone();
        if assessment.should_deload {
            reasoning.push(assessment.reason.clone());
        }
        if phase.is_deload() {
            reasoning.push(format!(
                "Deload week in progress; strain ceiling lowered to {:.1}",
                target_strain * self.monitor.config().deload_target_factor
            ));
        }

        let alerts = self.health_alerts(metrics, &classification, &assessment, baseline);
        let safety_alerts = alerts
            .iter()
            .map(|a| format!("{}: {}", a.message, a.recommendation))
            .collect();

        let load_reduction_percent = match classification.intensity {
            Intensity::Light => LIGHT_LOAD_REDUCTION,
            Intensity::Moderate => MODERATE_LOAD_REDUCTION,
            Intensity::High => 0.0,
        };

        let mut recommendation_text = classification.recommendation.clone();
        if assessment.should_deload {
            recommendation_text.push_str(". Begin a deload week");
        }

        let confidence = confidence_score(metrics, prior_day_strain, baseline);

        info!(
            date = %metrics.date,
            intensity = %classification.intensity,
            injury_risk = %classification.injury_risk,
            should_stop = classification.should_stop,
            should_deload = assessment.should_deload,
            confidence,
            "daily recommendation"
        );

        DailyRecommendation {
            date: metrics.date,
            intensity: classification.intensity,
            injury_risk: classification.injury_risk,
            should_stop: classification.should_stop,
            should_deload: assessment.should_deload,
            recommendation: recommendation_text,
            reasoning,
            safety_alerts,
            rest_multiplier,
            target_strain,
            load_reduction_percent,
            confidence,
            adaptation_source: classification.source,
        }
    }

    /// Health alerts for the day, in descending severity
    pub fn health_alerts(
        &self,
        metrics: &DailyMetrics,
        classification: &crate::classifier::Classification,
        assessment: &DeloadAssessment,
        baseline: Option<&HrvBaseline>,
    ) -> Vec<HealthAlert> {
        let thresholds = self.classifier.thresholds();
        let mut alerts = Vec::new();

        if classification.should_stop {
            alerts.push(HealthAlert::new(
                "Recovery signals critically low",
                AlertSeverity::High,
                "Rest today and reassess tomorrow",
            ));
        } else if classification.injury_risk == InjuryRisk::High {
            alerts.push(HealthAlert::new(
                "Injury risk elevated",
                AlertSeverity::Medium,
                "Reduce loads and stop if form breaks down",
            ));
        }

        if let (Some(hrv), Some(baseline)) = (metrics.hrv_rmssd, baseline) {
            if let Some(ratio) = baseline.deviation_ratio(hrv) {
                if ratio < thresholds.hrv_low_ratio && !classification.should_stop {
                    alerts.push(HealthAlert::new(
                        "HRV well below personal baseline",
                        AlertSeverity::Medium,
                        "Favor easy work and monitor how warm-ups feel",
                    ));
                }
            }
        }

        if assessment.should_deload {
            alerts.push(HealthAlert::new(
                "Sustained fatigue accumulating",
                AlertSeverity::Medium,
                "Schedule a deload week",
            ));
        }

        if let Some(sleep) = metrics.sleep_performance.filter(|s| s.is_finite()) {
            if sleep < thresholds.poor_sleep {
                alerts.push(HealthAlert::new(
                    "Sleep performance low",
                    AlertSeverity::Low,
                    "Prioritize sleep tonight",
                ));
            }
        }

        alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
        alerts
    }

    /// Scale a baseline prescription's rest periods by a recommendation
    pub fn adjusted_parameters(
        &self,
        baseline: &TrainingParameters,
        recommendation: &DailyRecommendation,
    ) -> TrainingParameters {
        rest::adjust_rest_periods(baseline, recommendation.rest_multiplier)
    }

    /// Evaluate progression readiness for one exercise
    pub fn evaluate_progression(
        &self,
        exercise: &str,
        current: &TrainingParameters,
        history: &[ProgressionSession],
        as_of: NaiveDate,
    ) -> ProgressionDecision {
        self.evaluator.evaluate(exercise, current, history, as_of)
    }

    /// Materialize a positive progression decision into new parameters.
    ///
    /// Beginners progress by one rep, everyone else by 2.5% load. The
    /// result passes through the safety limits; a negative decision
    /// returns the current parameters unchanged.
    pub fn apply_progression(
        &self,
        current: &TrainingParameters,
        decision: &ProgressionDecision,
        experience: ExperienceLevel,
    ) -> (TrainingParameters, Vec<String>) {
        if !decision.should_progress {
            return (current.clone(), Vec::new());
        }

        let proposed = match experience {
            ExperienceLevel::Beginner => TrainingParameters {
                reps: current.reps.saturating_add(1),
                ..current.clone()
            },
            ExperienceLevel::Intermediate | ExperienceLevel::Advanced => TrainingParameters {
                load: (current.load * dec!(1.025)).round_dp(1),
                ..current.clone()
            },
        };

        self.safety.apply(current, proposed)
    }

    /// Check cumulative strain against a target ceiling
    pub fn check_strain(
        &self,
        current_strain: f64,
        target_strain: f64,
        phase: &TrainingPhase,
    ) -> StrainStatus {
        self.monitor
            .check(current_strain, target_strain, phase.is_deload())
    }

    /// Assess whether a deload week should begin
    pub fn assess_deload(
        &self,
        recent: &[DailyMetrics],
        phase: &TrainingPhase,
        as_of: NaiveDate,
    ) -> DeloadAssessment {
        self.detector.assess(recent, phase, as_of)
    }

    /// Deload prescription for a baseline, clamped by the safety limits
    pub fn deload_parameters(&self, baseline: &TrainingParameters) -> TrainingParameters {
        let (params, _) = self
            .safety
            .apply(baseline, self.detector.deload_parameters(baseline));
        params
    }

    /// Enter a deload week starting today
    pub fn start_deload(&self, today: NaiveDate) -> TrainingPhase {
        self.detector.start_deload(today)
    }

    /// Apply the duration-based deload exit rule
    pub fn advance_phase(&self, phase: TrainingPhase, today: NaiveDate) -> TrainingPhase {
        self.detector.advance_phase(phase, today)
    }
}

impl Default for AdaptiveEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Confidence in the recommendation, driven by input completeness.
///
/// Starts at 0.9 with everything present and loses weight for each
/// missing signal, floored at 0.3.
fn confidence_score(
    metrics: &DailyMetrics,
    prior_day_strain: Option<f64>,
    baseline: Option<&HrvBaseline>,
) -> f64 {
    let mut confidence: f64 = 0.9;

    if metrics.recovery_score.is_none() {
        confidence -= 0.2;
    }
    let baseline_usable = matches!(baseline, Some(b) if b.is_established());
    if metrics.hrv_rmssd.is_none() || !baseline_usable {
        confidence -= 0.2;
    }
    if metrics.sleep_performance.is_none() {
        confidence -= 0.1;
    }
    if prior_day_strain.is_none() {
        confidence -= 0.1;
    }

    confidence.clamp(0.3, 0.9)
}
