use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use adaptrs::baseline::HrvBaseline;
use adaptrs::config::AppConfig;
use adaptrs::display;
use adaptrs::engine::AdaptiveEngine;
use adaptrs::error::{AdaptError, StoreError};
use adaptrs::export::json::ExportBundle;
use adaptrs::export::{csv as csv_export, json as json_export, DateRange, ExportFormat, ExportKind};
use adaptrs::import::parallel::{ParallelImportConfig, ParallelImporter};
use adaptrs::import::{file_sha256, DailyTrace, ImportBatch, ImportManager};
use adaptrs::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use adaptrs::models::{ExperienceLevel, TrainingParameters};
use adaptrs::sample::{self, SampleProfile};
use adaptrs::store::{SessionFilters, Store};
use adaptrs::strain::accumulate_strain;

/// Days of HRV history folded into the personal baseline
const BASELINE_WINDOW_DAYS: i64 = 30;

/// adaptrs - Adaptive Training CLI
///
/// Turns daily recovery and strain metrics into concrete training
/// adjustments: session intensity, rest periods, progression timing,
/// deload scheduling and strain ceilings.
#[derive(Parser)]
#[command(name = "adaptrs")]
#[command(author = "adaptrs contributors")]
#[command(version = "0.1.0")]
#[command(about = "Adaptive training recommendations from recovery and strain data", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, default_value = "compact")]
    log_format: String,

    /// Mirror logs into this file with daily rotation
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce and store the daily training recommendation
    Recommend {
        /// Date to recommend for (YYYY-MM-DD, default: latest metrics)
        #[arg(short, long)]
        date: Option<String>,

        /// Enter a deload week when the detector recommends one
        #[arg(long)]
        accept_deload: bool,
    },

    /// Adjust a session prescription for the day's recommendation
    Adjust {
        /// Date of the stored recommendation to apply
        #[arg(short, long)]
        date: Option<String>,

        /// Working load as percent of one-rep max
        #[arg(long, default_value = "70")]
        load: Decimal,

        /// Planned repetitions per set
        #[arg(long, default_value = "8")]
        reps: u32,

        /// Planned number of sets
        #[arg(long, default_value = "3")]
        sets: u32,

        /// Baseline rest between sets in seconds
        #[arg(long, default_value = "90")]
        rest_sets: u32,

        /// Baseline rest between exercises in seconds
        #[arg(long, default_value = "180")]
        rest_exercises: u32,

        /// Print the deload prescription instead
        #[arg(long)]
        deload: bool,
    },

    /// Evaluate progression readiness for an exercise
    Progression {
        /// Exercise to evaluate
        #[arg(short, long)]
        exercise: String,

        /// Evaluation date (YYYY-MM-DD, default: latest session)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Check cumulative strain against the day's ceiling
    Monitor {
        /// Date to check (YYYY-MM-DD, default: latest metrics)
        #[arg(short, long)]
        date: Option<String>,

        /// Cumulative strain so far (default: stored trace or daily metric)
        #[arg(long)]
        current: Option<f64>,
    },

    /// Import wearable metrics and session history
    Import {
        /// File or directory to import (CSV, JSON)
        #[arg(short, long)]
        path: PathBuf,

        /// Worker threads for directory imports
        #[arg(long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Re-import files whose content hash is already recorded
        #[arg(long)]
        force: bool,
    },

    /// Show stored metrics, sessions or recommendations
    History {
        /// What to list (metrics, sessions, recommendations)
        #[arg(short, long, default_value = "metrics")]
        kind: String,

        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Filter sessions by exercise
        #[arg(short, long)]
        exercise: Option<String>,

        /// Maximum rows to show
        #[arg(short, long, default_value = "30")]
        limit: usize,
    },

    /// Export stored data
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (csv, json)
        #[arg(short = 'f', long, default_value = "csv")]
        format: String,

        /// What to export (metrics, sessions, recommendations, bundle)
        #[arg(short, long, default_value = "metrics")]
        kind: String,

        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Generate deterministic sample data
    Sample {
        /// Trend profile (steady, accumulating, recovering)
        #[arg(short, long, default_value = "steady")]
        profile: String,

        /// Days of metrics to generate, ending today
        #[arg(short, long, default_value = "28")]
        days: u32,

        /// Sessions to generate for the sample exercise
        #[arg(long, default_value = "6")]
        sessions: u32,

        /// Exercise name for generated sessions
        #[arg(short, long, default_value = "Back Squat")]
        exercise: String,

        /// Seed for the deterministic generators
        #[arg(long, default_value = "7")]
        seed: u64,

        /// Write a JSON bundle here instead of the store
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect or initialize configuration
    Config {
        /// Print the active configuration as TOML
        #[arg(short, long)]
        list: bool,

        /// Write the default configuration file
        #[arg(long)]
        init: bool,

        /// Print the configuration file path
        #[arg(long)]
        path: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{}", format!("Error: {}", friendly_message(&err)).red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let log_config = LogConfig {
        level: LogLevel::from_verbosity(cli.verbose),
        format: cli
            .log_format
            .parse::<LogFormat>()
            .map_err(|e| anyhow::anyhow!(e))?,
        file_path: cli.log_file.clone(),
        ..LogConfig::default()
    };
    init_logging(&log_config)?;

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::load_or_default(),
    };

    match cli.command {
        Commands::Recommend {
            date,
            accept_deload,
        } => cmd_recommend(&config, date.as_deref(), accept_deload, cli.verbose > 0),

        Commands::Adjust {
            date,
            load,
            reps,
            sets,
            rest_sets,
            rest_exercises,
            deload,
        } => {
            let baseline = TrainingParameters {
                load,
                reps,
                sets,
                rest_between_sets: rest_sets,
                rest_between_exercises: rest_exercises,
                ..Default::default()
            };
            cmd_adjust(&config, date.as_deref(), &baseline, deload)
        }

        Commands::Progression { exercise, date } => {
            cmd_progression(&config, &exercise, date.as_deref())
        }

        Commands::Monitor { date, current } => cmd_monitor(&config, date.as_deref(), current),

        Commands::Import {
            path,
            threads,
            no_progress,
            force,
        } => cmd_import(&config, &path, threads, no_progress, force),

        Commands::History {
            kind,
            from,
            to,
            exercise,
            limit,
        } => cmd_history(
            &config,
            &kind,
            from.as_deref(),
            to.as_deref(),
            exercise,
            limit,
        ),

        Commands::Export {
            output,
            format,
            kind,
            from,
            to,
        } => cmd_export(&config, &output, &format, &kind, from.as_deref(), to.as_deref()),

        Commands::Sample {
            profile,
            days,
            sessions,
            exercise,
            seed,
            output,
        } => cmd_sample(
            &config,
            &profile,
            days,
            sessions,
            &exercise,
            seed,
            output.as_deref(),
        ),

        Commands::Config { list, init, path } => {
            cmd_config(&config, cli.config.as_deref(), list, init, path)
        }
    }
}

/// Prefer the domain error's user message over the raw context chain
fn friendly_message(err: &anyhow::Error) -> String {
    for cause in err.chain() {
        if let Some(domain) = cause.downcast_ref::<AdaptError>() {
            return domain.user_message();
        }
    }
    format!("{err:#}")
}

fn open_store(config: &AppConfig) -> Result<Store> {
    fs::create_dir_all(&config.settings.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.settings.data_dir.display()
        )
    })?;

    let path = config.database_path();
    let store =
        Store::new(&path).with_context(|| format!("Failed to open store at {}", path.display()))?;
    Ok(store)
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Explicit date, or the most recent day with stored metrics
fn resolve_date(store: &Store, date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(value) => parse_date(value),
        None => store
            .latest_metrics()?
            .map(|m| m.date)
            .context("No metrics stored yet. Import data or run `adaptrs sample` first"),
    }
}

fn cmd_recommend(
    config: &AppConfig,
    date: Option<&str>,
    accept_deload: bool,
    verbose: bool,
) -> Result<()> {
    let mut store = open_store(config)?;
    let date = resolve_date(&store, date)?;

    let metrics = store
        .metrics_for(date)?
        .with_context(|| format!("No metrics stored for {}", date))?;

    let engine = AdaptiveEngine::with_config(config.engine_config());

    // A finished deload week exits before today's decision is made
    let phase = engine.advance_phase(store.load_phase()?, date);

    let prior_day_strain = store
        .metrics_for(date - Duration::days(1))?
        .and_then(|m| m.strain);
    let recent = store.recent_metrics(date, config.deload.lookback_days)?;
    let hrv_history = store.hrv_history(date - Duration::days(1), BASELINE_WINDOW_DAYS)?;
    let baseline = HrvBaseline::from_history(&hrv_history);

    let recommendation =
        engine.recommend(&metrics, prior_day_strain, &recent, &phase, Some(&baseline));

    store.store_recommendation(&recommendation)?;

    let phase = if accept_deload && recommendation.should_deload {
        engine.start_deload(date)
    } else {
        phase
    };
    store.save_phase(&phase)?;

    display::print_recommendation(&recommendation, verbose);

    if accept_deload && recommendation.should_deload {
        println!(
            "{}",
            format!("✓ Deload week started on {}", date).yellow()
        );
    }

    Ok(())
}

fn cmd_adjust(
    config: &AppConfig,
    date: Option<&str>,
    baseline: &TrainingParameters,
    deload: bool,
) -> Result<()> {
    baseline.validate()?;

    let engine = AdaptiveEngine::with_config(config.engine_config());

    if deload {
        let adjusted = engine.deload_parameters(baseline);
        println!("{}", "Deload prescription".blue().bold());
        println!("{}", display::parameters_table(baseline, &adjusted));
        println!("{}", "✓ Deload parameters ready".green());
        return Ok(());
    }

    let store = open_store(config)?;
    let date = resolve_date(&store, date)?;
    let recommendation = store.recommendation_for(date)?.with_context(|| {
        format!(
            "No recommendation stored for {}. Run `adaptrs recommend` first",
            date
        )
    })?;

    let adjusted = engine.adjusted_parameters(baseline, &recommendation);

    println!(
        "{}",
        format!(
            "Rest adjustment for {} ({:.1}x)",
            date, recommendation.rest_multiplier
        )
        .blue()
        .bold()
    );
    println!("{}", display::parameters_table(baseline, &adjusted));
    if recommendation.load_reduction_percent > 0.0 {
        println!(
            "  {} Reduce working load about {:.0}% today",
            "⚠".yellow(),
            recommendation.load_reduction_percent
        );
    }
    println!("{}", "✓ Prescription adjusted".green());

    Ok(())
}

fn cmd_progression(config: &AppConfig, exercise: &str, date: Option<&str>) -> Result<()> {
    let store = open_store(config)?;
    let engine = AdaptiveEngine::with_config(config.engine_config());

    let sessions = store.query_sessions(&SessionFilters {
        exercise: Some(exercise.to_string()),
        ..Default::default()
    })?;
    let last = match sessions.last() {
        Some(last) => last,
        None => bail!("No sessions recorded for '{}'", exercise),
    };

    let as_of = match date {
        Some(value) => parse_date(value)?,
        None => last.date,
    };

    let decision = engine.evaluate_progression(exercise, &last.planned, &sessions, as_of);
    let experience = ExperienceLevel::from_session_count(sessions.len());
    let (next, notes) = engine.apply_progression(&last.planned, &decision, experience);

    display::print_progression(exercise, &decision, &last.planned, &next, &notes);

    Ok(())
}

fn cmd_monitor(config: &AppConfig, date: Option<&str>, current: Option<f64>) -> Result<()> {
    let store = open_store(config)?;
    let engine = AdaptiveEngine::with_config(config.engine_config());
    let date = resolve_date(&store, date)?;

    let current_strain = match current {
        Some(value) => value,
        None => match store.load_samples(date)? {
            Some(samples) => accumulate_strain(
                &samples,
                config.settings.max_heart_rate,
                config.settings.resting_heart_rate,
            ),
            None => store
                .metrics_for(date)?
                .and_then(|m| m.strain)
                .with_context(|| {
                    format!(
                        "No strain data for {}. Pass --current or import an intraday trace",
                        date
                    )
                })?,
        },
    };

    let recommendation = store.recommendation_for(date)?.with_context(|| {
        format!(
            "No recommendation stored for {}. Run `adaptrs recommend` first",
            date
        )
    })?;
    let phase = store.load_phase()?;

    let status = engine.check_strain(current_strain, recommendation.target_strain, &phase);
    display::print_strain_status(&status);

    Ok(())
}

struct StoredCounts {
    metrics: usize,
    sessions: usize,
    duplicates: usize,
    traces: usize,
}

/// Write a parsed batch into the store, skipping duplicate sessions
fn store_batch(store: &mut Store, batch: ImportBatch) -> Result<StoredCounts> {
    let mut counts = StoredCounts {
        metrics: batch.metrics.len(),
        sessions: 0,
        duplicates: 0,
        traces: batch.traces.len(),
    };

    for metrics in &batch.metrics {
        store.upsert_metrics(metrics)?;
    }

    for session in &batch.sessions {
        match store.store_session(session) {
            Ok(()) => counts.sessions += 1,
            Err(StoreError::Duplicate { .. }) => {
                warn!(id = %session.id, "skipping duplicate session");
                counts.duplicates += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    for trace in &batch.traces {
        store.store_samples(trace.date, &trace.samples)?;
    }

    Ok(counts)
}

fn cmd_import(
    config: &AppConfig,
    path: &Path,
    threads: Option<usize>,
    no_progress: bool,
    force: bool,
) -> Result<()> {
    let mut store = open_store(config)?;

    println!("{}", "Importing recovery and session data...".green().bold());

    let mut skipped_files = 0usize;
    let batch = if path.is_dir() {
        let manager = ImportManager::new();
        let mut fresh = Vec::new();
        for file in manager.collect_importable_files(path)? {
            let hash = file_sha256(&file)?;
            if !force && store.is_file_imported(&hash)? {
                skipped_files += 1;
                continue;
            }
            fresh.push(file);
        }

        let importer = ParallelImporter::with_config(ParallelImportConfig {
            num_threads: threads,
            show_progress: !no_progress,
            continue_on_error: true,
        });
        let (batch, summary) = importer.import_files(&fresh)?;

        println!("{}", summary.to_string_pretty());
        for result in summary.results.iter().filter(|r| r.success) {
            let hash = file_sha256(&result.file_path)?;
            store.mark_file_imported(&hash, &result.file_path.display().to_string())?;
        }
        batch
    } else {
        let hash = file_sha256(path)?;
        if !force && store.is_file_imported(&hash)? {
            println!(
                "{}",
                "File already imported (matching content hash); use --force to repeat".yellow()
            );
            return Ok(());
        }

        let manager = ImportManager::new();
        let batch = manager.import_file(path)?;
        store.mark_file_imported(&hash, &path.display().to_string())?;
        batch
    };

    let counts = store_batch(&mut store, batch)?;

    if skipped_files > 0 {
        println!("  Skipped {} previously imported files", skipped_files);
    }
    println!(
        "  Stored: {} metric days, {} sessions ({} duplicates skipped), {} traces",
        counts.metrics, counts.sessions, counts.duplicates, counts.traces
    );
    println!();
    display::print_stats(&store.stats()?);
    println!("{}", "✓ Import completed successfully".green());

    Ok(())
}

fn cmd_history(
    config: &AppConfig,
    kind: &str,
    from: Option<&str>,
    to: Option<&str>,
    exercise: Option<String>,
    limit: usize,
) -> Result<()> {
    let store = open_store(config)?;
    let range = DateRange::new(
        from.map(parse_date).transpose()?,
        to.map(parse_date).transpose()?,
    );
    let (start, end) = range.effective_bounds();

    match kind.to_lowercase().as_str() {
        "metrics" => {
            let mut rows = store.metrics_range(start, end)?;
            if rows.len() > limit {
                rows = rows.split_off(rows.len() - limit);
            }
            if rows.is_empty() {
                println!("No metrics in range");
            } else {
                println!("{}", display::metrics_table(&rows));
            }
        }
        "sessions" => {
            let mut rows = store.query_sessions(&SessionFilters {
                exercise,
                start_date: range.start,
                end_date: range.end,
                limit: None,
            })?;
            if rows.len() > limit {
                rows = rows.split_off(rows.len() - limit);
            }
            if rows.is_empty() {
                println!("No sessions in range");
            } else {
                println!("{}", display::sessions_table(&rows));
            }
        }
        "recommendations" | "recs" => {
            let mut rows = store.recommendations_range(start, end)?;
            if rows.len() > limit {
                rows = rows.split_off(rows.len() - limit);
            }
            if rows.is_empty() {
                println!("No recommendations in range");
            } else {
                println!("{}", display::recommendations_table(&rows));
            }
        }
        other => bail!(
            "Unknown history kind '{}'. Expected metrics, sessions or recommendations",
            other
        ),
    }

    Ok(())
}

fn cmd_export(
    config: &AppConfig,
    output: &Path,
    format: &str,
    kind: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let store = open_store(config)?;
    let format = ExportFormat::from_str(format).map_err(AdaptError::from)?;
    let kind = ExportKind::from_str(kind).map_err(|_| {
        anyhow::anyhow!(
            "Unknown export kind '{}'. Expected metrics, sessions, recommendations or bundle",
            kind
        )
    })?;
    let range = DateRange::new(
        from.map(parse_date).transpose()?,
        to.map(parse_date).transpose()?,
    );
    let (start, end) = range.effective_bounds();

    println!("{}", "Exporting stored data...".yellow().bold());

    match kind {
        ExportKind::Metrics => {
            let rows = store.metrics_range(start, end)?;
            match format {
                ExportFormat::Csv => csv_export::export_metrics(&rows, output)?,
                ExportFormat::Json => json_export::export_metrics(&rows, output)?,
            }
            println!("  {} metric days -> {}", rows.len(), output.display());
        }
        ExportKind::Sessions => {
            let rows = store.query_sessions(&SessionFilters {
                exercise: None,
                start_date: range.start,
                end_date: range.end,
                limit: None,
            })?;
            match format {
                ExportFormat::Csv => csv_export::export_sessions(&rows, output)?,
                ExportFormat::Json => json_export::export_sessions(&rows, output)?,
            }
            println!("  {} sessions -> {}", rows.len(), output.display());
        }
        ExportKind::Recommendations => {
            let rows = store.recommendations_range(start, end)?;
            match format {
                ExportFormat::Csv => csv_export::export_recommendations(&rows, output)?,
                ExportFormat::Json => json_export::export_recommendations(&rows, output)?,
            }
            println!("  {} recommendations -> {}", rows.len(), output.display());
        }
        ExportKind::Bundle => {
            if format == ExportFormat::Csv {
                bail!("Bundle export is JSON only; pass --format json");
            }
            let bundle = ExportBundle {
                metrics: store.metrics_range(start, end)?,
                sessions: store.query_sessions(&SessionFilters {
                    exercise: None,
                    start_date: range.start,
                    end_date: range.end,
                    limit: None,
                })?,
                recommendations: store.recommendations_range(start, end)?,
                traces: store
                    .samples_range(start, end)?
                    .into_iter()
                    .map(|(date, samples)| DailyTrace { date, samples })
                    .collect(),
            };
            json_export::export_bundle(&bundle, output)?;
            println!(
                "  {} metric days, {} sessions, {} recommendations, {} traces -> {}",
                bundle.metrics.len(),
                bundle.sessions.len(),
                bundle.recommendations.len(),
                bundle.traces.len(),
                output.display()
            );
        }
    }

    println!("{}", "✓ Export completed successfully".yellow());

    Ok(())
}

fn cmd_sample(
    config: &AppConfig,
    profile: &str,
    days: u32,
    sessions: u32,
    exercise: &str,
    seed: u64,
    output: Option<&Path>,
) -> Result<()> {
    let profile = profile
        .parse::<SampleProfile>()
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("{}", "Generating sample data...".cyan().bold());
    println!("  Profile: {}  Days: {}  Sessions: {}  Seed: {}", profile, days, sessions, seed);

    // Metrics end today so `recommend` works on fresh output
    let today = Local::now().date_naive();
    let metrics_start = today - Duration::days(i64::from(days.max(1)) - 1);
    let metrics = sample::metric_series(profile, metrics_start, days, seed);

    let improving = profile != SampleProfile::Accumulating;
    let session_start = today - Duration::days((i64::from(sessions.max(1)) - 1) * 2);
    let history = sample::session_history(
        exercise,
        &TrainingParameters::default(),
        session_start,
        sessions,
        seed,
        improving,
    );

    let trace = DailyTrace {
        date: today,
        samples: sample::intraday_samples(3600, seed),
    };

    match output {
        Some(path) => {
            let bundle = ExportBundle {
                metrics,
                sessions: history,
                recommendations: Vec::new(),
                traces: vec![trace],
            };
            json_export::export_bundle(&bundle, path)?;
            println!(
                "{}",
                format!("✓ Sample bundle written to {}", path.display()).cyan()
            );
        }
        None => {
            let mut store = open_store(config)?;
            let counts = store_batch(
                &mut store,
                ImportBatch {
                    metrics,
                    sessions: history,
                    traces: vec![trace],
                },
            )?;
            println!(
                "{}",
                format!(
                    "✓ Stored {} metric days, {} sessions, {} trace",
                    counts.metrics, counts.sessions, counts.traces
                )
                .cyan()
            );
        }
    }

    Ok(())
}

fn cmd_config(
    config: &AppConfig,
    config_path: Option<&Path>,
    list: bool,
    init: bool,
    path: bool,
) -> Result<()> {
    println!("{}", "Managing configuration...".white().bold());

    let effective_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::default_config_path);

    if init {
        let mut fresh = AppConfig::default();
        fresh.save_to_file(&effective_path)?;
        println!("  Wrote {}", effective_path.display());
        println!("{}", "✓ Default configuration written".white());
    } else if list {
        let rendered = toml::to_string_pretty(config)?;
        println!("{rendered}");
    } else if path {
        println!("{}", effective_path.display());
    } else {
        println!("  Use --list, --init or --path");
    }

    Ok(())
}
