//! Recovery/strain classification
//!
//! Maps a day's readiness metrics (recovery score, strain, HRV, sleep) to a
//! discrete training-intensity recommendation and injury-risk level. The
//! rules are simple bands over the inputs; every cutpoint lives in
//! [`ClassifierThresholds`] so callers can tune them without touching the
//! logic. Missing metrics substitute neutral defaults so the classifier
//! always answers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::baseline::HrvBaseline;
use crate::models::{AdaptationSource, DailyMetrics, InjuryRisk, Intensity};

/// Cutpoints for the readiness bands and the HRV/strain rules.
///
/// Defaults follow the common wearable convention: red below 33%, green
/// above 66%, with a stop line at 25%.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Below this recovery score the athlete is in the red band
    pub low_recovery: f64,

    /// Above this recovery score the athlete is in the green band
    pub high_recovery: f64,

    /// Below this recovery score training should stop entirely
    pub critical_recovery: f64,

    /// Prior-day strain at or above this caps a green day down one level
    pub elevated_strain: f64,

    /// HRV below this fraction of baseline caps intensity down one level
    pub hrv_low_ratio: f64,

    /// HRV below this fraction of baseline forces a rest day
    pub hrv_critical_ratio: f64,

    /// Sleep performance below this is flagged in the reasoning
    pub poor_sleep: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        ClassifierThresholds {
            low_recovery: 33.0,
            high_recovery: 66.0,
            critical_recovery: 25.0,
            elevated_strain: 14.0,
            hrv_low_ratio: 0.85,
            hrv_critical_ratio: 0.70,
            poor_sleep: 60.0,
        }
    }
}

/// Readiness band for a recovery score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadinessBand {
    /// Recovery critically low; training should stop
    Critical,
    /// Recovery in the red band
    Low,
    /// Recovery in the middle band
    Moderate,
    /// Recovery in the green band
    High,
}

impl ReadinessBand {
    /// Band a recovery score using the configured cutpoints
    pub fn from_score(score: f64, thresholds: &ClassifierThresholds) -> Self {
        if score < thresholds.critical_recovery {
            ReadinessBand::Critical
        } else if score < thresholds.low_recovery {
            ReadinessBand::Low
        } else if score <= thresholds.high_recovery {
            ReadinessBand::Moderate
        } else {
            ReadinessBand::High
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReadinessBand::Critical => "Critically under-recovered",
            ReadinessBand::Low => "Under-recovered",
            ReadinessBand::Moderate => "Moderately recovered",
            ReadinessBand::High => "Well recovered",
        }
    }
}

/// Result of classifying one day of metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Recommended session intensity
    pub intensity: Intensity,

    /// Assessed injury risk
    pub injury_risk: InjuryRisk,

    /// Training should stop or not start today
    pub should_stop: bool,

    /// One-line summary for display
    pub recommendation: String,

    /// Signals that led to the decision
    pub reasoning: Vec<String>,

    /// Which signal path decided the outcome
    pub source: AdaptationSource,
}

/// Recovery/strain classifier
pub struct Classifier {
    thresholds: ClassifierThresholds,
}

impl Classifier {
    pub fn new() -> Self {
        Self::with_thresholds(ClassifierThresholds::default())
    }

    pub fn with_thresholds(thresholds: ClassifierThresholds) -> Self {
        Classifier { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    /// Classify one day of metrics.
    ///
    /// `prior_day_strain` is yesterday's cumulative strain, if known.
    /// `baseline` is the athlete's HRV baseline; without an established
    /// baseline the HRV rules are skipped.
    pub fn classify(
        &self,
        metrics: &DailyMetrics,
        prior_day_strain: Option<f64>,
        baseline: Option<&HrvBaseline>,
    ) -> Classification {
        let t = &self.thresholds;
        let mut reasoning = Vec::new();
        let mut should_stop = false;
        let mut source = AdaptationSource::RecoveryMetrics;

        let recovery = metrics
            .recovery_score
            .filter(|r| r.is_finite())
            .map(|r| r.clamp(0.0, 100.0));

        // Recovery banding first; everything else can only cap the result.
        let (mut intensity, mut injury_risk) = match recovery {
            Some(score) => {
                let band = ReadinessBand::from_score(score, t);
                match band {
                    ReadinessBand::Critical => {
                        should_stop = true;
                        reasoning.push(format!(
                            "Recovery critically low at {:.0}% (stop line {:.0}%)",
                            score, t.critical_recovery
                        ));
                        (Intensity::Light, InjuryRisk::High)
                    }
                    ReadinessBand::Low => {
                        reasoning.push(format!(
                            "Recovery low at {:.0}% (red below {:.0}%)",
                            score, t.low_recovery
                        ));
                        (Intensity::Light, InjuryRisk::High)
                    }
                    ReadinessBand::Moderate => {
                        reasoning.push(format!("Recovery moderate at {:.0}%", score));
                        (Intensity::Moderate, InjuryRisk::Moderate)
                    }
                    ReadinessBand::High => {
                        reasoning.push(format!(
                            "Recovery high at {:.0}% (green above {:.0}%)",
                            score, t.high_recovery
                        ));
                        (Intensity::High, InjuryRisk::Low)
                    }
                }
            }
            None => {
                source = AdaptationSource::DefaultFallback;
                reasoning
                    .push("No recovery score available; assuming moderate readiness".to_string());
                (Intensity::Moderate, InjuryRisk::Moderate)
            }
        };

        // HRV far below the athlete's own baseline overrides a good score.
        if let (Some(hrv), Some(baseline)) = (metrics.hrv_rmssd, baseline) {
            if let Some(ratio) = baseline.deviation_ratio(hrv) {
                let below_pct = (1.0 - ratio) * 100.0;
                if ratio < t.hrv_critical_ratio {
                    intensity = Intensity::Light;
                    injury_risk = InjuryRisk::High;
                    should_stop = true;
                    reasoning.push(format!(
                        "HRV {:.0} ms is {:.0}% below baseline ({:.0} ms)",
                        hrv, below_pct, baseline.rmssd_mean
                    ));
                } else if ratio < t.hrv_low_ratio {
                    intensity = intensity.capped_down();
                    injury_risk = injury_risk.max(InjuryRisk::Moderate);
                    reasoning.push(format!(
                        "HRV {:.0} ms is {:.0}% below baseline; holding intensity back",
                        hrv, below_pct
                    ));
                }
            }
        }

        // Elevated strain carried over from yesterday caps a green day.
        if let Some(prior) = prior_day_strain.filter(|s| s.is_finite()) {
            if prior >= t.elevated_strain {
                if intensity == Intensity::High {
                    intensity = intensity.capped_down();
                    injury_risk = injury_risk.max(InjuryRisk::Moderate);
                    source = AdaptationSource::StrainTrend;
                    reasoning.push(format!(
                        "Yesterday's strain {:.1} still elevated; capping intensity",
                        prior
                    ));
                } else {
                    reasoning.push(format!("Yesterday's strain {:.1} was elevated", prior));
                }
            }
        }

        if let Some(sleep) = metrics.sleep_performance.filter(|s| s.is_finite()) {
            if sleep < t.poor_sleep {
                reasoning.push(format!("Sleep performance low at {:.0}%", sleep));
            }
        }

        if should_stop {
            source = AdaptationSource::SafetyOverride;
        }

        let recommendation = recommendation_text(intensity, injury_risk, should_stop);

        debug!(
            intensity = %intensity,
            injury_risk = %injury_risk,
            should_stop,
            "classified daily metrics"
        );

        Classification {
            intensity,
            injury_risk,
            should_stop,
            recommendation,
            reasoning,
            source,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

fn recommendation_text(intensity: Intensity, risk: InjuryRisk, should_stop: bool) -> String {
    if should_stop {
        return "Rest today: recovery signals are critically low".to_string();
    }
    let base = match intensity {
        Intensity::Light => "Keep it light: technique work, mobility, low loads",
        Intensity::Moderate => "Train at moderate intensity with normal working loads",
        Intensity::High => "Green light for a high-intensity session",
    };
    if risk == InjuryRisk::High {
        format!("{}. Injury risk is elevated; stop if form breaks down", base)
    } else {
        base.to_string()
    }
}
