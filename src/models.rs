use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CalculationError;

/// Training intensity recommendation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    Moderate,
    High,
}

impl Intensity {
    /// Drop one level, saturating at Light
    pub fn capped_down(&self) -> Self {
        match self {
            Intensity::High => Intensity::Moderate,
            Intensity::Moderate => Intensity::Light,
            Intensity::Light => Intensity::Light,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Intensity::Light => "Light session: technique work and low loads",
            Intensity::Moderate => "Moderate session: normal working loads",
            Intensity::High => "High-intensity session: full planned loads",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Light => "light",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
        }
    }
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Intensity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" | "easy" | "low" => Ok(Intensity::Light),
            "moderate" | "medium" => Ok(Intensity::Moderate),
            "high" | "hard" => Ok(Intensity::High),
            _ => Err(format!("Unknown intensity: {}", s)),
        }
    }
}

/// Injury risk levels attached to a daily recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjuryRisk {
    Low,
    Moderate,
    High,
}

impl InjuryRisk {
    pub fn description(&self) -> &'static str {
        match self {
            InjuryRisk::Low => "Low injury risk: body is ready for planned work",
            InjuryRisk::Moderate => "Moderate injury risk: watch form and fatigue",
            InjuryRisk::High => "High injury risk: reduce load or rest",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InjuryRisk::Low => "low",
            InjuryRisk::Moderate => "moderate",
            InjuryRisk::High => "high",
        }
    }
}

impl std::fmt::Display for InjuryRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Strength-session prescription parameters
///
/// Load is expressed as a percentage of one-rep max. Rest fields are in
/// whole seconds; the rest adjuster and deload builder only ever produce
/// non-negative values for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParameters {
    /// Working load as percent of one-rep max
    pub load: Decimal,

    /// Planned repetitions per set
    pub reps: u32,

    /// Planned number of sets
    pub sets: u32,

    /// Rest between sets in seconds
    pub rest_between_sets: u32,

    /// Rest between exercises in seconds
    pub rest_between_exercises: u32,

    /// Session intensity bucket
    pub intensity: Intensity,

    /// Whether these parameters describe a deload week
    pub is_deload_week: bool,
}

impl TrainingParameters {
    pub fn new(load: Decimal, reps: u32, sets: u32) -> Self {
        TrainingParameters {
            load,
            reps,
            sets,
            ..Default::default()
        }
    }

    /// Check structural invariants: positive set/rep counts and a load
    /// that is plausible as a percentage of one-rep max.
    pub fn validate(&self) -> Result<(), CalculationError> {
        if self.reps == 0 {
            return Err(CalculationError::InvalidParameters {
                reason: "reps must be at least 1".to_string(),
            });
        }
        if self.sets == 0 {
            return Err(CalculationError::InvalidParameters {
                reason: "sets must be at least 1".to_string(),
            });
        }
        if self.load <= Decimal::ZERO || self.load > dec!(150) {
            return Err(CalculationError::InvalidParameters {
                reason: format!("load {}% of 1RM is out of range", self.load),
            });
        }
        Ok(())
    }

    /// Total planned repetitions across all sets
    pub fn planned_total_reps(&self) -> u32 {
        self.reps.saturating_mul(self.sets)
    }
}

impl Default for TrainingParameters {
    fn default() -> Self {
        TrainingParameters {
            load: dec!(70),
            reps: 8,
            sets: 3,
            rest_between_sets: 90,
            rest_between_exercises: 180,
            intensity: Intensity::Moderate,
            is_deload_week: false,
        }
    }
}

/// One day of wearable-derived readiness metrics
///
/// Every metric is optional. Wearables drop readings routinely, and the
/// calculators substitute neutral defaults instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    /// Date of the reading
    pub date: NaiveDate,

    /// Composite recovery score, 0-100
    pub recovery_score: Option<f64>,

    /// Cumulative day strain on the 0-21 scale
    pub strain: Option<f64>,

    /// Heart-rate variability as RMSSD in milliseconds
    pub hrv_rmssd: Option<f64>,

    /// Sleep performance score, 0-100
    pub sleep_performance: Option<f64>,

    /// Resting heart rate in bpm
    pub resting_heart_rate: Option<f64>,
}

impl DailyMetrics {
    pub fn new(date: NaiveDate) -> Self {
        DailyMetrics {
            date,
            recovery_score: None,
            strain: None,
            hrv_rmssd: None,
            sleep_performance: None,
            resting_heart_rate: None,
        }
    }

    /// True when at least one metric is present
    pub fn has_any_reading(&self) -> bool {
        self.recovery_score.is_some()
            || self.strain.is_some()
            || self.hrv_rmssd.is_some()
            || self.sleep_performance.is_some()
            || self.resting_heart_rate.is_some()
    }
}

/// Single intraday heart-rate sample used for strain accumulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrainSample {
    /// Seconds from the start of the recording
    pub offset_secs: u32,

    /// Heart rate in beats per minute
    pub heart_rate: u16,
}

/// A completed strength session, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionSession {
    /// Unique session identifier
    #[serde(default)]
    pub id: String,

    /// Exercise name this session belongs to
    pub exercise: String,

    /// Date the session was performed
    pub date: NaiveDate,

    /// Parameters that were prescribed for the session
    pub planned: TrainingParameters,

    /// Repetitions actually completed, one entry per set
    pub completed_reps: Vec<u32>,

    /// Session RPE on the 1-10 scale, when recorded
    pub perceived_effort: Option<f64>,

    /// Recovery score on the morning of the session
    pub recovery_before: Option<f64>,

    /// Strain recorded after the session
    pub strain_after: Option<f64>,
}

impl ProgressionSession {
    pub fn new(exercise: &str, date: NaiveDate, planned: TrainingParameters) -> Self {
        ProgressionSession {
            id: Uuid::new_v4().to_string(),
            exercise: exercise.to_string(),
            date,
            planned,
            completed_reps: Vec::new(),
            perceived_effort: None,
            recovery_before: None,
            strain_after: None,
        }
    }

    /// Ratio of completed to planned repetitions across the whole session.
    ///
    /// Returns `None` for malformed records (no completed sets, or a plan
    /// with zero total reps) so callers can skip them.
    pub fn completion_ratio(&self) -> Option<f64> {
        if self.completed_reps.is_empty() {
            return None;
        }
        let planned_total = self.planned.planned_total_reps();
        if planned_total == 0 {
            return None;
        }
        let completed: u32 = self.completed_reps.iter().sum();
        Some(f64::from(completed) / f64::from(planned_total))
    }

    /// True when the record carries enough coherent data to score.
    ///
    /// Perceived effort outside the 1-10 scale marks the record malformed,
    /// as does an empty rep list.
    pub fn is_well_formed(&self) -> bool {
        if self.completion_ratio().is_none() {
            return false;
        }
        if let Some(effort) = self.perceived_effort {
            if !effort.is_finite() || !(1.0..=10.0).contains(&effort) {
                return false;
            }
        }
        true
    }
}

/// Where the recommendation's decisive signal came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationSource {
    /// Full recovery metrics drove the classification
    RecoveryMetrics,
    /// Strain trend or prior-day strain drove the classification
    StrainTrend,
    /// A safety rule overrode the metric-driven result
    SafetyOverride,
    /// Defaults substituted for missing metrics
    DefaultFallback,
}

impl AdaptationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdaptationSource::RecoveryMetrics => "recovery_metrics",
            AdaptationSource::StrainTrend => "strain_trend",
            AdaptationSource::SafetyOverride => "safety_override",
            AdaptationSource::DefaultFallback => "default_fallback",
        }
    }
}

impl std::fmt::Display for AdaptationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Daily training recommendation produced by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecommendation {
    /// Date the recommendation applies to
    pub date: NaiveDate,

    /// Recommended session intensity
    pub intensity: Intensity,

    /// Assessed injury risk
    pub injury_risk: InjuryRisk,

    /// Training should stop or not start today
    pub should_stop: bool,

    /// A deload week should begin
    pub should_deload: bool,

    /// One-line summary for display
    pub recommendation: String,

    /// Signals that led to the decision
    pub reasoning: Vec<String>,

    /// Alerts that warrant the athlete's attention
    pub safety_alerts: Vec<String>,

    /// Multiplier to apply to baseline rest periods
    pub rest_multiplier: f64,

    /// Strain ceiling for the day
    pub target_strain: f64,

    /// Suggested load reduction in percent, 0 when none
    pub load_reduction_percent: f64,

    /// Confidence in the recommendation, 0-1
    pub confidence: f64,

    /// Signal path that produced the decision
    pub adaptation_source: AdaptationSource,
}

/// Outcome of a progression evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressionDecision {
    /// Whether to increase load or reps
    pub should_progress: bool,

    /// Human-readable explanation of the decision
    pub reasoning: String,
}

/// Alert severity for health warnings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health warning surfaced alongside a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthAlert {
    /// What was detected
    pub message: String,

    /// How urgent it is
    pub severity: AlertSeverity,

    /// Whether the athlete should act before training
    pub requires_attention: bool,

    /// What to do about it
    pub recommendation: String,
}

impl HealthAlert {
    pub fn new(message: &str, severity: AlertSeverity, recommendation: &str) -> Self {
        HealthAlert {
            message: message.to_string(),
            severity,
            requires_attention: severity >= AlertSeverity::Medium,
            recommendation: recommendation.to_string(),
        }
    }
}

/// Athlete experience buckets, derived from recorded session count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    /// Bucket by how many sessions are on record
    pub fn from_session_count(count: usize) -> Self {
        if count < 10 {
            ExperienceLevel::Beginner
        } else if count < 50 {
            ExperienceLevel::Intermediate
        } else {
            ExperienceLevel::Advanced
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Building movement patterns; progress by adding reps",
            ExperienceLevel::Intermediate => "Established technique; progress by adding load",
            ExperienceLevel::Advanced => "Long training history; progress by adding load",
        }
    }
}
