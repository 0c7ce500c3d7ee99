use anyhow::Result;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::import::{validation::ImportValidator, DailyTrace, ImportBatch, ImportFormat};
use crate::models::{DailyMetrics, Intensity, ProgressionSession, StrainSample, TrainingParameters};

/// What a CSV file contains, decided from its headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CsvKind {
    Metrics,
    Sessions,
    Samples,
}

/// CSV importer with flexible column mapping
///
/// Wearable and spreadsheet exports disagree on header names, so each
/// canonical column accepts a set of aliases. The record kind is sniffed
/// from the aliased headers: an exercise column means sessions, an
/// offset plus heart-rate pair means an intraday trace, otherwise dated
/// rows with at least one metric column are daily metrics.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Shared
        Self::add_mapping(&mut column_mapping, "date", &["date", "day", "cycle_date"]);

        // Daily metrics
        Self::add_mapping(
            &mut column_mapping,
            "recovery_score",
            &["recovery_score", "recovery", "readiness", "readiness_score"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "strain",
            &["strain", "day_strain", "strain_score"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "hrv_rmssd",
            &["hrv_rmssd", "hrv", "rmssd", "heart_rate_variability"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "sleep_performance",
            &["sleep_performance", "sleep_score", "sleep"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "resting_heart_rate",
            &["resting_heart_rate", "resting_hr", "rhr"],
        );

        // Sessions
        Self::add_mapping(
            &mut column_mapping,
            "exercise",
            &["exercise", "movement", "lift"],
        );
        Self::add_mapping(&mut column_mapping, "load", &["load", "load_percent"]);
        Self::add_mapping(&mut column_mapping, "reps", &["reps", "planned_reps"]);
        Self::add_mapping(&mut column_mapping, "sets", &["sets", "planned_sets"]);
        Self::add_mapping(
            &mut column_mapping,
            "rest_between_sets",
            &["rest_between_sets", "rest_sets", "set_rest"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "rest_between_exercises",
            &["rest_between_exercises", "rest_exercises", "exercise_rest"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "completed_reps",
            &["completed_reps", "reps_completed", "actual_reps"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "perceived_effort",
            &["perceived_effort", "rpe", "effort"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "recovery_before",
            &["recovery_before", "pre_recovery"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "strain_after",
            &["strain_after", "post_strain"],
        );
        Self::add_mapping(&mut column_mapping, "intensity", &["intensity"]);

        // Intraday samples
        Self::add_mapping(
            &mut column_mapping,
            "offset_secs",
            &["offset_secs", "offset", "elapsed", "elapsed_secs"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "heart_rate",
            &["heart_rate", "hr", "heartrate", "bpm"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    fn parse_date(date_str: &str) -> Result<NaiveDate> {
        let formats = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

        for format in &formats {
            if let Ok(date) = NaiveDate::parse_from_str(date_str, format) {
                return Ok(date);
            }
        }

        anyhow::bail!("Unable to parse date: {}", date_str);
    }

    /// Map each canonical column name to its index
    fn index_headers(&self, headers: &StringRecord) -> HashMap<String, usize> {
        let mut index = HashMap::new();
        for (i, name) in headers.iter().enumerate() {
            index.entry(self.normalize_column_name(name)).or_insert(i);
        }
        index
    }

    fn detect_kind(index: &HashMap<String, usize>) -> Option<CsvKind> {
        if index.contains_key("exercise") {
            return Some(CsvKind::Sessions);
        }
        if index.contains_key("offset_secs") && index.contains_key("heart_rate") {
            return Some(CsvKind::Samples);
        }

        let metric_columns = [
            "recovery_score",
            "strain",
            "hrv_rmssd",
            "sleep_performance",
            "resting_heart_rate",
        ];
        if index.contains_key("date") && metric_columns.iter().any(|c| index.contains_key(*c)) {
            return Some(CsvKind::Metrics);
        }

        None
    }

    fn import_metrics(
        &self,
        records: &[StringRecord],
        index: &HashMap<String, usize>,
    ) -> Result<Vec<DailyMetrics>> {
        let mut metrics = Vec::new();

        for (row, record) in records.iter().enumerate() {
            match self.metrics_from_record(record, index) {
                Ok(mut m) => match ImportValidator::validate_metrics(&mut m) {
                    Ok(()) => metrics.push(m),
                    Err(e) => warn!(row = row + 2, error = %e, "skipping metrics row"),
                },
                Err(e) => warn!(row = row + 2, error = %e, "skipping metrics row"),
            }
        }

        if metrics.is_empty() {
            anyhow::bail!("No valid metric rows found in CSV file");
        }

        Ok(metrics)
    }

    fn metrics_from_record(
        &self,
        record: &StringRecord,
        index: &HashMap<String, usize>,
    ) -> Result<DailyMetrics> {
        let date = Self::parse_date(
            field(record, index, "date").ok_or_else(|| anyhow::anyhow!("missing date"))?,
        )?;

        Ok(DailyMetrics {
            date,
            recovery_score: parse_f64(record, index, "recovery_score"),
            strain: parse_f64(record, index, "strain"),
            hrv_rmssd: parse_f64(record, index, "hrv_rmssd"),
            sleep_performance: parse_f64(record, index, "sleep_performance"),
            resting_heart_rate: parse_f64(record, index, "resting_heart_rate"),
        })
    }

    fn import_sessions(
        &self,
        records: &[StringRecord],
        index: &HashMap<String, usize>,
    ) -> Result<Vec<ProgressionSession>> {
        let mut sessions = Vec::new();

        for (row, record) in records.iter().enumerate() {
            match self.session_from_record(record, index) {
                Ok(mut s) => match ImportValidator::validate_session(&mut s) {
                    Ok(()) => sessions.push(s),
                    Err(e) => warn!(row = row + 2, error = %e, "skipping session row"),
                },
                Err(e) => warn!(row = row + 2, error = %e, "skipping session row"),
            }
        }

        if sessions.is_empty() {
            anyhow::bail!("No valid session rows found in CSV file");
        }

        Ok(sessions)
    }

    fn session_from_record(
        &self,
        record: &StringRecord,
        index: &HashMap<String, usize>,
    ) -> Result<ProgressionSession> {
        let exercise =
            field(record, index, "exercise").ok_or_else(|| anyhow::anyhow!("missing exercise"))?;
        let date = Self::parse_date(
            field(record, index, "date").ok_or_else(|| anyhow::anyhow!("missing date"))?,
        )?;

        let defaults = TrainingParameters::default();
        let planned = TrainingParameters {
            load: field(record, index, "load")
                .map(Decimal::from_str)
                .transpose()?
                .unwrap_or(defaults.load),
            reps: parse_u32(record, index, "reps")?.unwrap_or(defaults.reps),
            sets: parse_u32(record, index, "sets")?.unwrap_or(defaults.sets),
            rest_between_sets: parse_u32(record, index, "rest_between_sets")?
                .unwrap_or(defaults.rest_between_sets),
            rest_between_exercises: parse_u32(record, index, "rest_between_exercises")?
                .unwrap_or(defaults.rest_between_exercises),
            intensity: field(record, index, "intensity")
                .map(Intensity::from_str)
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?
                .unwrap_or(defaults.intensity),
            is_deload_week: false,
        };

        let mut session = ProgressionSession::new(exercise, date, planned);
        session.completed_reps = field(record, index, "completed_reps")
            .map(parse_rep_list)
            .transpose()?
            .unwrap_or_default();
        session.perceived_effort = parse_f64(record, index, "perceived_effort");
        session.recovery_before = parse_f64(record, index, "recovery_before");
        session.strain_after = parse_f64(record, index, "strain_after");

        Ok(session)
    }

    fn import_samples(
        &self,
        records: &[StringRecord],
        index: &HashMap<String, usize>,
    ) -> Result<Vec<DailyTrace>> {
        let mut by_date: BTreeMap<NaiveDate, Vec<StrainSample>> = BTreeMap::new();

        for (row, record) in records.iter().enumerate() {
            let parsed = (|| -> Result<(NaiveDate, StrainSample)> {
                let date = Self::parse_date(
                    field(record, index, "date").ok_or_else(|| anyhow::anyhow!("missing date"))?,
                )?;
                let offset_secs = parse_u32(record, index, "offset_secs")?
                    .ok_or_else(|| anyhow::anyhow!("missing offset"))?;
                let heart_rate: u16 = field(record, index, "heart_rate")
                    .ok_or_else(|| anyhow::anyhow!("missing heart rate"))?
                    .parse()?;

                Ok((
                    date,
                    StrainSample {
                        offset_secs,
                        heart_rate,
                    },
                ))
            })();

            match parsed {
                Ok((date, sample)) => by_date.entry(date).or_default().push(sample),
                Err(e) => warn!(row = row + 2, error = %e, "skipping sample row"),
            }
        }

        let mut traces = Vec::new();
        for (date, mut samples) in by_date {
            match ImportValidator::validate_samples(&mut samples) {
                Ok(()) => traces.push(DailyTrace { date, samples }),
                Err(e) => warn!(%date, error = %e, "skipping intraday trace"),
            }
        }

        if traces.is_empty() {
            anyhow::bail!("No valid sample rows found in CSV file");
        }

        Ok(traces)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<ImportBatch> {
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(file_path)?;

        let index = self.index_headers(reader.headers()?);
        let kind = Self::detect_kind(&index).ok_or_else(|| {
            anyhow::anyhow!(
                "Unrecognized CSV columns in {}: expected metric, session or sample headers",
                file_path.display()
            )
        })?;

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?);
        }

        let mut batch = ImportBatch::default();
        match kind {
            CsvKind::Metrics => batch.metrics = self.import_metrics(&records, &index)?,
            CsvKind::Sessions => batch.sessions = self.import_sessions(&records, &index)?,
            CsvKind::Samples => batch.traces = self.import_samples(&records, &index)?,
        }

        Ok(batch)
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

fn field<'a>(
    record: &'a StringRecord,
    index: &HashMap<String, usize>,
    name: &str,
) -> Option<&'a str> {
    index
        .get(name)
        .and_then(|&i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_f64(record: &StringRecord, index: &HashMap<String, usize>, name: &str) -> Option<f64> {
    let raw = field(record, index, name)?;
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(field = name, value = raw, "dropped unparseable number");
            None
        }
    }
}

fn parse_u32(
    record: &StringRecord,
    index: &HashMap<String, usize>,
    name: &str,
) -> Result<Option<u32>> {
    field(record, index, name)
        .map(|raw| {
            raw.parse::<u32>()
                .map_err(|e| anyhow::anyhow!("{}: {}", name, e))
        })
        .transpose()
}

/// Parse a per-set rep list like "8|8|7", "8;8;7" or "8/8/7"
fn parse_rep_list(raw: &str) -> Result<Vec<u32>> {
    let reps: Vec<u32> = raw
        .split(|c| matches!(c, '|' | ';' | '/' | ','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|e| anyhow::anyhow!("completed_reps: {}", e))
        })
        .collect::<Result<_>>()?;

    Ok(reps)
}
