use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::ImportExportError;
use crate::import::DailyTrace;
use crate::models::{DailyMetrics, DailyRecommendation, ProgressionSession};

/// Everything the store knows, in one JSON document.
///
/// The field names line up with the JSON importer, so a bundle can be
/// imported back into an empty store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportBundle {
    #[serde(default)]
    pub metrics: Vec<DailyMetrics>,
    #[serde(default)]
    pub sessions: Vec<ProgressionSession>,
    #[serde(default)]
    pub recommendations: Vec<DailyRecommendation>,
    #[serde(default)]
    pub traces: Vec<DailyTrace>,
}

/// Export daily metrics as a JSON array
pub fn export_metrics<P: AsRef<Path>>(
    metrics: &[DailyMetrics],
    output_path: P,
) -> Result<(), ImportExportError> {
    write_json(&metrics, output_path)
}

/// Export sessions as a JSON array
pub fn export_sessions<P: AsRef<Path>>(
    sessions: &[ProgressionSession],
    output_path: P,
) -> Result<(), ImportExportError> {
    write_json(&sessions, output_path)
}

/// Export recommendations as a JSON array
pub fn export_recommendations<P: AsRef<Path>>(
    recommendations: &[DailyRecommendation],
    output_path: P,
) -> Result<(), ImportExportError> {
    write_json(&recommendations, output_path)
}

/// Export a full bundle
pub fn export_bundle<P: AsRef<Path>>(
    bundle: &ExportBundle,
    output_path: P,
) -> Result<(), ImportExportError> {
    write_json(bundle, output_path)
}

fn write_json<T: Serialize, P: AsRef<Path>>(
    value: &T,
    output_path: P,
) -> Result<(), ImportExportError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ImportExportError::ParseError {
        format: "JSON".to_string(),
        reason: e.to_string(),
    })?;

    let mut file = std::fs::File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    writeln!(file)?;

    Ok(())
}
