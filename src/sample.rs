//! Deterministic sample-data generation
//!
//! Builds realistic metric series, session histories and intraday
//! heart-rate traces for demos and tests. Generation is pure: the same
//! seed always yields the same data, with day-to-day variation driven
//! by phase-shifted sine waves rather than a random source.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::{DailyMetrics, ProgressionSession, StrainSample, TrainingParameters};

/// Shape of the generated metric series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleProfile {
    /// Stable mid-range recovery and moderate strain
    Steady,
    /// Declining recovery under sustained high strain
    Accumulating,
    /// Recovery climbing back after a hard block
    Recovering,
}

impl SampleProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleProfile::Steady => "steady",
            SampleProfile::Accumulating => "accumulating",
            SampleProfile::Recovering => "recovering",
        }
    }
}

impl FromStr for SampleProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "steady" => Ok(SampleProfile::Steady),
            "accumulating" | "fatigue" => Ok(SampleProfile::Accumulating),
            "recovering" | "rebound" => Ok(SampleProfile::Recovering),
            other => Err(format!(
                "Unknown sample profile: {} (expected steady, accumulating or recovering)",
                other
            )),
        }
    }
}

impl std::fmt::Display for SampleProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn wave(seed: u64, day: u32, scale: f64) -> f64 {
    ((seed.wrapping_add(u64::from(day)) as f64) * scale).sin()
}

/// Generate one metric row per day, oldest first
pub fn metric_series(
    profile: SampleProfile,
    start: NaiveDate,
    days: u32,
    seed: u64,
) -> Vec<DailyMetrics> {
    let span = f64::from(days.max(2) - 1);

    (0..days)
        .map(|day| {
            // 0.0 at the start of the window, 1.0 at the end
            let t = f64::from(day) / span;
            let jitter = wave(seed, day, 0.7);

            let (recovery_base, strain_base, hrv_base) = match profile {
                SampleProfile::Steady => (65.0, 10.0, 60.0),
                SampleProfile::Accumulating => {
                    (70.0 - 35.0 * t, 13.0 + 4.0 * t, 62.0 - 14.0 * t)
                }
                SampleProfile::Recovering => (40.0 + 45.0 * t, 14.0 - 6.0 * t, 48.0 + 14.0 * t),
            };

            DailyMetrics {
                date: start + Duration::days(i64::from(day)),
                recovery_score: Some((recovery_base + 7.0 * jitter).clamp(1.0, 99.0)),
                strain: Some((strain_base + 1.5 * wave(seed, day, 1.3)).clamp(0.0, 21.0)),
                hrv_rmssd: Some((hrv_base + 4.0 * wave(seed, day, 0.9)).max(15.0)),
                sleep_performance: Some((72.0 + 12.0 * wave(seed, day, 0.5)).clamp(20.0, 100.0)),
                resting_heart_rate: Some((54.0 - 4.0 * jitter).clamp(40.0, 75.0)),
            }
        })
        .collect()
}

/// Generate a training history for one exercise, oldest first.
///
/// Sessions land every other day. An `improving` history completes the
/// full prescription with effort easing over time; otherwise completion
/// slips and effort creeps up.
pub fn session_history(
    exercise: &str,
    planned: &TrainingParameters,
    start: NaiveDate,
    sessions: u32,
    seed: u64,
    improving: bool,
) -> Vec<ProgressionSession> {
    let span = f64::from(sessions.max(2) - 1);

    (0..sessions)
        .map(|n| {
            let t = f64::from(n) / span;
            let date = start + Duration::days(i64::from(n) * 2);
            let mut session = ProgressionSession::new(exercise, date, planned.clone());

            let dropped = if improving {
                0
            } else {
                // Later sets fall short as fatigue builds
                ((2.0 * t).round() as u32).min(planned.reps.saturating_sub(1))
            };
            session.completed_reps = (0..planned.sets)
                .map(|set| {
                    if set + 1 == planned.sets {
                        planned.reps - dropped
                    } else {
                        planned.reps
                    }
                })
                .collect();

            let effort_base = if improving { 8.0 - 1.5 * t } else { 7.0 + 2.0 * t };
            session.perceived_effort =
                Some((effort_base + 0.3 * wave(seed, n, 1.1)).clamp(1.0, 10.0));
            session.recovery_before = Some(
                (if improving { 55.0 + 20.0 * t } else { 65.0 - 25.0 * t }
                    + 5.0 * wave(seed, n, 0.6))
                .clamp(1.0, 99.0),
            );
            session.strain_after =
                Some((11.0 + 2.0 * wave(seed, n, 0.8)).clamp(0.0, 21.0));
            session
        })
        .collect()
}

/// Generate an intraday heart-rate trace at five-second resolution.
///
/// The trace warms up, oscillates through work intervals and winds
/// down, staying within a plausible 95-185 bpm envelope.
pub fn intraday_samples(duration_secs: u32, seed: u64) -> Vec<StrainSample> {
    const STEP_SECS: u32 = 5;
    let steps = duration_secs / STEP_SECS;
    let span = f64::from(steps.max(2) - 1);

    (0..steps)
        .map(|n| {
            let t = f64::from(n) / span;
            // Ramp in and out of the session with intervals in the middle
            let envelope = (std::f64::consts::PI * t).sin();
            let interval = wave(seed, n, 0.25);
            let hr = 95.0 + 70.0 * envelope + 12.0 * interval;

            StrainSample {
                offset_secs: n * STEP_SECS,
                heart_rate: hr.clamp(60.0, 200.0).round() as u16,
            }
        })
        .collect()
}
