use std::io::Write;
use std::path::Path;

use crate::error::ImportExportError;
use crate::models::{DailyMetrics, DailyRecommendation, ProgressionSession};

/// Export daily metrics to CSV format
pub fn export_metrics<P: AsRef<Path>>(
    metrics: &[DailyMetrics],
    output_path: P,
) -> Result<(), ImportExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Date,Recovery_Score,Strain,HRV_RMSSD,Sleep_Performance,Resting_Heart_Rate"
    )?;

    for m in metrics {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            m.date.format("%Y-%m-%d"),
            m.recovery_score.map_or("".to_string(), |v| v.to_string()),
            m.strain.map_or("".to_string(), |v| v.to_string()),
            m.hrv_rmssd.map_or("".to_string(), |v| v.to_string()),
            m.sleep_performance.map_or("".to_string(), |v| v.to_string()),
            m.resting_heart_rate.map_or("".to_string(), |v| v.to_string()),
        )?;
    }

    Ok(())
}

/// Export sessions to CSV format
///
/// Per-set rep counts are pipe-joined so the CSV importer reads its own
/// output back.
pub fn export_sessions<P: AsRef<Path>>(
    sessions: &[ProgressionSession],
    output_path: P,
) -> Result<(), ImportExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Exercise,Date,Load,Reps,Sets,Rest_Between_Sets,Rest_Between_Exercises,\
         Completed_Reps,Perceived_Effort,Recovery_Before,Strain_After"
    )?;

    for s in sessions {
        let completed = s
            .completed_reps
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("|");

        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{}",
            s.exercise,
            s.date.format("%Y-%m-%d"),
            s.planned.load,
            s.planned.reps,
            s.planned.sets,
            s.planned.rest_between_sets,
            s.planned.rest_between_exercises,
            completed,
            s.perceived_effort.map_or("".to_string(), |v| v.to_string()),
            s.recovery_before.map_or("".to_string(), |v| v.to_string()),
            s.strain_after.map_or("".to_string(), |v| v.to_string()),
        )?;
    }

    Ok(())
}

/// Export daily recommendations to CSV format
pub fn export_recommendations<P: AsRef<Path>>(
    recommendations: &[DailyRecommendation],
    output_path: P,
) -> Result<(), ImportExportError> {
    let mut file = std::fs::File::create(output_path)?;

    writeln!(
        file,
        "Date,Intensity,Injury_Risk,Should_Stop,Should_Deload,Rest_Multiplier,\
         Target_Strain,Load_Reduction_Percent,Confidence,Source,Recommendation,Reasoning"
    )?;

    for r in recommendations {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{},{},{},{},{}",
            r.date.format("%Y-%m-%d"),
            r.intensity,
            r.injury_risk,
            if r.should_stop { "1" } else { "0" },
            if r.should_deload { "1" } else { "0" },
            r.rest_multiplier,
            r.target_strain,
            r.load_reduction_percent,
            r.confidence,
            r.adaptation_source,
            quote(&r.recommendation),
            quote(&r.reasoning.join("; ")),
        )?;
    }

    Ok(())
}

fn quote(raw: &str) -> String {
    format!("\"{}\"", raw.replace('"', "\"\""))
}
