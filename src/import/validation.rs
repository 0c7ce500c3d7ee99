use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::models::{DailyMetrics, ProgressionSession, StrainSample};

/// Validate and clean imported training data
///
/// Out-of-range readings are dropped rather than failing the whole
/// record; a record only fails when nothing usable remains.
pub struct ImportValidator;

impl ImportValidator {
    /// Validate one day of metrics, dropping implausible readings
    pub fn validate_metrics(metrics: &mut DailyMetrics) -> Result<()> {
        Self::validate_date(metrics.date)?;

        Self::clean_range(&mut metrics.recovery_score, 0.0, 100.0, "recovery_score");
        Self::clean_range(&mut metrics.strain, 0.0, 21.0, "strain");
        Self::clean_range(&mut metrics.hrv_rmssd, 1.0, 300.0, "hrv_rmssd");
        Self::clean_range(&mut metrics.sleep_performance, 0.0, 100.0, "sleep_performance");
        Self::clean_range(
            &mut metrics.resting_heart_rate,
            25.0,
            120.0,
            "resting_heart_rate",
        );

        if !metrics.has_any_reading() {
            anyhow::bail!("No usable readings for {}", metrics.date);
        }

        Ok(())
    }

    /// Validate a completed session, dropping implausible readings
    pub fn validate_session(session: &mut ProgressionSession) -> Result<()> {
        Self::validate_date(session.date)?;

        if session.exercise.trim().is_empty() {
            anyhow::bail!("Session is missing an exercise name");
        }

        session
            .planned
            .validate()
            .map_err(|e| anyhow::anyhow!("Session {}: {}", session.id, e))?;

        if session.completed_reps.is_empty() {
            anyhow::bail!("Session {} has no completed sets", session.id);
        }
        if session.completed_reps.iter().any(|&reps| reps > 100) {
            anyhow::bail!("Session {} has an implausible rep count", session.id);
        }

        Self::clean_range(&mut session.perceived_effort, 1.0, 10.0, "perceived_effort");
        Self::clean_range(&mut session.recovery_before, 0.0, 100.0, "recovery_before");
        Self::clean_range(&mut session.strain_after, 0.0, 21.0, "strain_after");

        Ok(())
    }

    /// Validate an intraday trace: sort, dedup, drop implausible rates
    pub fn validate_samples(samples: &mut Vec<StrainSample>) -> Result<()> {
        samples.sort_by_key(|s| s.offset_secs);
        samples.dedup_by_key(|s| s.offset_secs);

        let before = samples.len();
        samples.retain(|s| (30..=220).contains(&s.heart_rate));
        let dropped = before - samples.len();
        if dropped > 0 {
            warn!(dropped, "dropped heart-rate samples outside 30-220 bpm");
        }

        if samples.is_empty() {
            anyhow::bail!("No usable heart-rate samples remain");
        }

        Ok(())
    }

    fn validate_date(date: NaiveDate) -> Result<()> {
        let now = Utc::now().date_naive();
        let min_date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or(NaiveDate::MIN);

        if date > now {
            anyhow::bail!("Date cannot be in the future: {}", date);
        }
        if date < min_date {
            anyhow::bail!("Date is too far in the past: {}", date);
        }

        Ok(())
    }

    fn clean_range(value: &mut Option<f64>, min: f64, max: f64, field: &str) {
        if let Some(v) = *value {
            if !v.is_finite() || v < min || v > max {
                warn!(field, value = v, "dropped out-of-range reading");
                *value = None;
            }
        }
    }
}
