// Example: Daily Recommendation Pipeline
//
// This example walks through the library pipeline end to end: generate a
// fatiguing block of metrics, establish an HRV baseline, ask the engine
// for a recommendation and apply it to a session prescription.

use chrono::NaiveDate;

use adaptrs::baseline::HrvBaseline;
use adaptrs::deload::TrainingPhase;
use adaptrs::engine::AdaptiveEngine;
use adaptrs::models::TrainingParameters;
use adaptrs::sample::{self, SampleProfile};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Daily Recommendation Example");
    println!("============================\n");

    let engine = AdaptiveEngine::new();
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).ok_or("bad date")?;

    // Two weeks of declining recovery under sustained strain
    let series = sample::metric_series(SampleProfile::Accumulating, start, 14, 7);
    let today = series.last().ok_or("empty series")?.clone();
    let prior_strain = series[series.len() - 2].strain;

    println!("Generated {} days of metrics", series.len());
    println!(
        "  Today: recovery {:.0}, strain {:.1}, HRV {:.1} ms\n",
        today.recovery_score.unwrap_or(0.0),
        today.strain.unwrap_or(0.0),
        today.hrv_rmssd.unwrap_or(0.0)
    );

    // Personal HRV baseline from everything before today
    let readings: Vec<f64> = series[..series.len() - 1]
        .iter()
        .filter_map(|m| m.hrv_rmssd)
        .collect();
    let baseline = HrvBaseline::from_history(&readings);
    println!(
        "✓ Baseline established: {:.1} ms mean over {} readings\n",
        baseline.rmssd_mean,
        readings.len()
    );

    // The recommendation folds in the classifier, rest adjuster,
    // deload detector and strain targets
    let rec = engine.recommend(
        &today,
        prior_strain,
        &series,
        &TrainingPhase::Normal,
        Some(&baseline),
    );

    println!("Recommendation for {}:", rec.date);
    println!("  Intensity:      {}", rec.intensity);
    println!("  Injury risk:    {}", rec.injury_risk);
    println!("  Rest periods:   {:.1}x baseline", rec.rest_multiplier);
    println!("  Strain ceiling: {:.1}", rec.target_strain);
    println!("  Deload week:    {}", rec.should_deload);
    for line in &rec.reasoning {
        println!("    - {}", line);
    }
    println!();

    // Apply the rest multiplier to a concrete prescription
    let planned = TrainingParameters::default();
    let adjusted = engine.adjusted_parameters(&planned, &rec);
    println!(
        "Prescription: {}x{} at {}% 1RM, rest {} s -> {} s",
        planned.sets, planned.reps, planned.load, planned.rest_between_sets, adjusted.rest_between_sets
    );

    // Mid-session check against the ceiling
    let status = engine.check_strain(9.5, rec.target_strain, &TrainingPhase::Normal);
    println!(
        "Strain check at 9.5: {:.0}% of ceiling, stop = {}",
        status.progress * 100.0,
        status.should_stop
    );

    println!("\n✓ Pipeline complete");
    Ok(())
}
