use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

use crate::import::{validation::ImportValidator, DailyTrace, ImportBatch, ImportFormat};
use crate::models::{DailyMetrics, ProgressionSession};

/// Top-level shape of an adaptrs JSON file
///
/// Matches the JSON exporter's output, so exported data imports back
/// unchanged. Any section may be omitted.
#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(default)]
    metrics: Vec<DailyMetrics>,
    #[serde(default)]
    sessions: Vec<ProgressionSession>,
    #[serde(default)]
    traces: Vec<DailyTrace>,
}

/// JSON importer for metrics, sessions and intraday traces
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        file_path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    fn import_file(&self, file_path: &Path) -> Result<ImportBatch> {
        let content = std::fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read {}", file_path.display()))?;

        let parsed: ImportFile = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", file_path.display()))?;

        let mut batch = ImportBatch::default();

        for mut metrics in parsed.metrics {
            match ImportValidator::validate_metrics(&mut metrics) {
                Ok(()) => batch.metrics.push(metrics),
                Err(e) => warn!(date = %metrics.date, error = %e, "skipping metrics record"),
            }
        }

        for mut session in parsed.sessions {
            if session.id.is_empty() {
                session.id = Uuid::new_v4().to_string();
            }
            match ImportValidator::validate_session(&mut session) {
                Ok(()) => batch.sessions.push(session),
                Err(e) => warn!(date = %session.date, error = %e, "skipping session record"),
            }
        }

        for mut trace in parsed.traces {
            match ImportValidator::validate_samples(&mut trace.samples) {
                Ok(()) => batch.traces.push(trace),
                Err(e) => warn!(date = %trace.date, error = %e, "skipping intraday trace"),
            }
        }

        if batch.is_empty() {
            anyhow::bail!("No valid records found in {}", file_path.display());
        }

        Ok(batch)
    }

    fn get_format_name(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_json(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_import_mixed_file() {
        let file = write_json(
            r#"{
                "metrics": [
                    {"date": "2024-06-01", "recovery_score": 72.0, "strain": 13.4},
                    {"date": "2024-06-02", "recovery_score": 300.0}
                ],
                "sessions": [
                    {
                        "exercise": "Squat",
                        "date": "2024-06-01",
                        "planned": {
                            "load": "80", "reps": 8, "sets": 3,
                            "rest_between_sets": 90, "rest_between_exercises": 180,
                            "intensity": "moderate", "is_deload_week": false
                        },
                        "completed_reps": [8, 8, 7],
                        "perceived_effort": 7.5
                    }
                ],
                "traces": [
                    {"date": "2024-06-01", "samples": [
                        {"offset_secs": 0, "heart_rate": 120},
                        {"offset_secs": 5, "heart_rate": 132}
                    ]}
                ]
            }"#,
        );

        let importer = JsonImporter::new();
        let batch = importer.import_file(file.path()).unwrap();

        // The 300.0 recovery day has nothing left after cleaning
        assert_eq!(batch.metrics.len(), 1);
        assert_eq!(batch.sessions.len(), 1);
        assert_eq!(batch.traces.len(), 1);
        assert!(!batch.sessions[0].id.is_empty());
    }

    #[test]
    fn test_empty_object_rejected() {
        let file = write_json("{}");
        let importer = JsonImporter::new();
        assert!(importer.import_file(file.path()).is_err());
    }

    #[test]
    fn test_malformed_json_rejected() {
        let file = write_json("{not json");
        let importer = JsonImporter::new();
        let err = importer.import_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }
}
