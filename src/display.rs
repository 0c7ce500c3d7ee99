//! Terminal rendering for recommendations, history tables, and status lines.

use colored::*;
use tabled::{settings::Style, Table, Tabled};

use crate::models::{
    DailyMetrics, DailyRecommendation, Intensity, InjuryRisk, ProgressionDecision,
    ProgressionSession, TrainingParameters,
};
use crate::store::StoreStats;
use crate::strain::StrainStatus;

/// Format an optional metric with fixed precision, "-" when absent
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

fn intensity_label(intensity: Intensity) -> ColoredString {
    match intensity {
        Intensity::Light => "light".yellow(),
        Intensity::Moderate => "moderate".cyan(),
        Intensity::High => "high".green(),
    }
}

fn risk_label(risk: InjuryRisk) -> ColoredString {
    match risk {
        InjuryRisk::Low => "low".green(),
        InjuryRisk::Moderate => "moderate".yellow(),
        InjuryRisk::High => "high".red(),
    }
}

#[derive(Tabled)]
struct MetricsRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Recovery")]
    recovery: String,
    #[tabled(rename = "Strain")]
    strain: String,
    #[tabled(rename = "HRV (ms)")]
    hrv: String,
    #[tabled(rename = "Sleep")]
    sleep: String,
    #[tabled(rename = "RHR")]
    rhr: String,
}

/// Daily metrics as a table, one row per day
pub fn metrics_table(metrics: &[DailyMetrics]) -> Table {
    let rows: Vec<MetricsRow> = metrics
        .iter()
        .map(|m| MetricsRow {
            date: m.date.to_string(),
            recovery: fmt_opt(m.recovery_score, 0),
            strain: fmt_opt(m.strain, 1),
            hrv: fmt_opt(m.hrv_rmssd, 1),
            sleep: fmt_opt(m.sleep_performance, 0),
            rhr: fmt_opt(m.resting_heart_rate, 0),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}

#[derive(Tabled)]
struct SessionRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Exercise")]
    exercise: String,
    #[tabled(rename = "Load %1RM")]
    load: String,
    #[tabled(rename = "Planned")]
    planned: String,
    #[tabled(rename = "Completed")]
    completed: String,
    #[tabled(rename = "RPE")]
    effort: String,
}

/// Completed sessions as a table, one row per session
pub fn sessions_table(sessions: &[ProgressionSession]) -> Table {
    let rows: Vec<SessionRow> = sessions
        .iter()
        .map(|s| SessionRow {
            date: s.date.to_string(),
            exercise: s.exercise.clone(),
            load: s.planned.load.to_string(),
            planned: format!("{}x{}", s.planned.sets, s.planned.reps),
            completed: s
                .completed_reps
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(","),
            effort: fmt_opt(s.perceived_effort, 1),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Intensity")]
    intensity: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Rest x")]
    rest: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Flags")]
    flags: String,
}

/// Stored recommendations as a table, one row per day
pub fn recommendations_table(recommendations: &[DailyRecommendation]) -> Table {
    let rows: Vec<RecommendationRow> = recommendations
        .iter()
        .map(|r| {
            let mut flags = Vec::new();
            if r.should_stop {
                flags.push("stop");
            }
            if r.should_deload {
                flags.push("deload");
            }
            RecommendationRow {
                date: r.date.to_string(),
                intensity: r.intensity.to_string(),
                risk: r.injury_risk.to_string(),
                rest: format!("{:.1}", r.rest_multiplier),
                target: format!("{:.1}", r.target_strain),
                flags: flags.join(","),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}

#[derive(Tabled)]
struct ParameterRow {
    #[tabled(rename = "Parameter")]
    name: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Adjusted")]
    adjusted: String,
}

/// Side-by-side comparison of two prescriptions
pub fn parameters_table(current: &TrainingParameters, adjusted: &TrainingParameters) -> Table {
    let rows = vec![
        ParameterRow {
            name: "Load (%1RM)".to_string(),
            current: current.load.to_string(),
            adjusted: adjusted.load.to_string(),
        },
        ParameterRow {
            name: "Reps".to_string(),
            current: current.reps.to_string(),
            adjusted: adjusted.reps.to_string(),
        },
        ParameterRow {
            name: "Sets".to_string(),
            current: current.sets.to_string(),
            adjusted: adjusted.sets.to_string(),
        },
        ParameterRow {
            name: "Rest between sets (s)".to_string(),
            current: current.rest_between_sets.to_string(),
            adjusted: adjusted.rest_between_sets.to_string(),
        },
        ParameterRow {
            name: "Rest between exercises (s)".to_string(),
            current: current.rest_between_exercises.to_string(),
            adjusted: adjusted.rest_between_exercises.to_string(),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}

/// Print a full daily recommendation with alerts and reasoning
pub fn print_recommendation(rec: &DailyRecommendation, verbose: bool) {
    println!(
        "{}",
        format!("Training recommendation for {}", rec.date)
            .green()
            .bold()
    );
    println!(
        "  Intensity:      {} ({})",
        intensity_label(rec.intensity),
        rec.intensity.description()
    );
    println!("  Injury risk:    {}", risk_label(rec.injury_risk));
    println!("  Rest periods:   {:.1}x baseline", rec.rest_multiplier);
    println!("  Strain ceiling: {:.1}", rec.target_strain);
    if rec.load_reduction_percent > 0.0 {
        println!("  Load reduction: {:.0}%", rec.load_reduction_percent);
    }
    println!("  Confidence:     {:.0}%", rec.confidence * 100.0);
    println!();
    println!("  {}", rec.recommendation);

    if !rec.safety_alerts.is_empty() {
        println!();
        for alert in &rec.safety_alerts {
            println!("  {} {}", "⚠".yellow().bold(), alert.yellow());
        }
    }

    if verbose && !rec.reasoning.is_empty() {
        println!();
        println!("  {}", "Reasoning:".dimmed());
        for line in &rec.reasoning {
            println!("    {}", format!("- {}", line).dimmed());
        }
    }

    println!();
    if rec.should_stop {
        println!("{}", "✗ Do not train today".red().bold());
    } else if rec.should_deload {
        println!("{}", "⚠ Begin a deload week".yellow().bold());
    } else {
        println!("{}", "✓ Cleared to train".green());
    }
}

/// Print a progression decision, with the applied parameters when positive
pub fn print_progression(
    exercise: &str,
    decision: &ProgressionDecision,
    current: &TrainingParameters,
    next: &TrainingParameters,
    notes: &[String],
) {
    println!(
        "{}",
        format!("Progression check: {}", exercise).blue().bold()
    );
    println!("  {}", decision.reasoning);
    println!();

    if decision.should_progress {
        println!("{}", parameters_table(current, next));
        for note in notes {
            println!("  {} {}", "⚠".yellow(), note.yellow());
        }
        println!();
        println!("{}", "✓ Ready to progress".green());
    } else {
        println!("{}", "Holding current parameters".yellow());
    }
}

/// Print a strain-target check result
pub fn print_strain_status(status: &StrainStatus) {
    println!("{}", "Strain monitor".cyan().bold());
    println!("  {}", status.message);
    println!("  Ceiling used:   {:.0}%", status.progress * 100.0);
    println!();
    if status.should_stop {
        println!("{}", "✗ Stop for today".red().bold());
    } else {
        println!("{}", "✓ Under the ceiling".green());
    }
}

/// Print store statistics
pub fn print_stats(stats: &StoreStats) {
    println!("{}", "Stored data".white().bold());
    println!("  Metric days:     {}", stats.metric_days);
    println!("  Sessions:        {}", stats.session_count);
    println!("  Recommendations: {}", stats.recommendation_count);
    println!("  Intraday traces: {}", stats.sample_days);
    if stats.sample_days > 0 {
        println!(
            "  Trace storage:   {} -> {} bytes ({:.1}x)",
            stats.total_original_size, stats.total_compressed_size, stats.compression_ratio
        );
    }
}
