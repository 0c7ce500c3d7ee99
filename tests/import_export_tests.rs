//! Import/export round-trip tests
//!
//! These write real fixture files to disk and run them through the
//! import manager, covering:
//! - Header-alias mapping in CSV metrics files
//! - Session CSVs with pipe-joined rep lists
//! - Intraday sample CSVs grouped into per-day traces
//! - JSON bundle export feeding back through the importer
//! - Validation dropping implausible rows instead of failing files
//! - SHA256 dedup fingerprints

use adaptrs::export;
use adaptrs::import::{file_sha256, DailyTrace, ImportManager};
use adaptrs::models::{DailyMetrics, StrainSample, TrainingParameters};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, n).unwrap()
}

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_csv_metrics_with_aliased_headers() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "whoop_export.csv",
        "Cycle_Date,Recovery,Day_Strain,RMSSD,Sleep Score,RHR\n\
         2024-04-01,72,13.4,58.2,85,51\n\
         2024-04-02,45,16.1,41.0,62,56\n",
    );

    let manager = ImportManager::new();
    let batch = manager.import_file(&path).unwrap();

    assert_eq!(batch.metrics.len(), 2);
    assert!(batch.sessions.is_empty());
    assert!(batch.traces.is_empty());

    let first = &batch.metrics[0];
    assert_eq!(first.date, day(1));
    assert_eq!(first.recovery_score, Some(72.0));
    assert_eq!(first.strain, Some(13.4));
    assert_eq!(first.hrv_rmssd, Some(58.2));
    assert_eq!(first.sleep_performance, Some(85.0));
    assert_eq!(first.resting_heart_rate, Some(51.0));
}

#[test]
fn test_csv_sessions_with_rep_lists() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "sessions.csv",
        "Exercise,Date,Load,Reps,Sets,Completed_Reps,RPE\n\
         Back Squat,2024-04-03,82.5,5,5,5|5|5|5|4,8.5\n\
         Bench Press,2024-04-03,75,8,3,8|8|8,7\n",
    );

    let manager = ImportManager::new();
    let batch = manager.import_file(&path).unwrap();

    assert_eq!(batch.sessions.len(), 2);

    let squat = &batch.sessions[0];
    assert_eq!(squat.exercise, "Back Squat");
    assert_eq!(squat.date, day(3));
    assert_eq!(squat.planned.load, dec!(82.5));
    assert_eq!(squat.planned.reps, 5);
    assert_eq!(squat.planned.sets, 5);
    assert_eq!(squat.completed_reps, vec![5, 5, 5, 5, 4]);
    assert_eq!(squat.perceived_effort, Some(8.5));
    assert!(!squat.id.is_empty());

    // Unmapped columns fall back to the default prescription
    let bench = &batch.sessions[1];
    assert_eq!(
        bench.planned.rest_between_sets,
        TrainingParameters::default().rest_between_sets
    );
}

#[test]
fn test_csv_samples_group_into_daily_traces() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(
        &dir,
        "trace.csv",
        "Date,Elapsed,HR\n\
         2024-04-05,0,102\n\
         2024-04-05,5,110\n\
         2024-04-05,10,118\n\
         2024-04-06,0,98\n\
         2024-04-06,5,105\n",
    );

    let manager = ImportManager::new();
    let batch = manager.import_file(&path).unwrap();

    assert_eq!(batch.traces.len(), 2);
    assert_eq!(batch.traces[0].date, day(5));
    assert_eq!(batch.traces[0].samples.len(), 3);
    assert_eq!(batch.traces[1].date, day(6));
    assert_eq!(batch.traces[1].samples[1].heart_rate, 105);
}

#[test]
fn test_validation_drops_bad_rows_not_files() {
    let dir = TempDir::new().unwrap();
    // Row 2 has an impossible recovery score and nothing else usable;
    // row 3 keeps its strain after the bad reading is dropped.
    let path = write_fixture(
        &dir,
        "partial.csv",
        "Date,Recovery,Strain\n\
         2024-04-01,65,12.0\n\
         2024-04-02,300,\n\
         2024-04-03,250,9.5\n",
    );

    let manager = ImportManager::new();
    let batch = manager.import_file(&path).unwrap();

    assert_eq!(batch.metrics.len(), 2);
    assert_eq!(batch.metrics[0].date, day(1));
    assert_eq!(batch.metrics[1].date, day(3));
    assert_eq!(batch.metrics[1].recovery_score, None);
    assert_eq!(batch.metrics[1].strain, Some(9.5));
}

#[test]
fn test_json_bundle_reimports_unchanged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bundle.json");

    let mut session = adaptrs::models::ProgressionSession::new(
        "Deadlift",
        day(8),
        TrainingParameters::default(),
    );
    session.completed_reps = vec![8, 8, 8];
    session.perceived_effort = Some(7.5);

    let bundle = export::json::ExportBundle {
        metrics: vec![DailyMetrics {
            date: day(8),
            recovery_score: Some(68.0),
            strain: Some(11.2),
            hrv_rmssd: Some(55.5),
            sleep_performance: Some(79.0),
            resting_heart_rate: Some(52.0),
        }],
        sessions: vec![session.clone()],
        recommendations: Vec::new(),
        traces: vec![DailyTrace {
            date: day(8),
            samples: vec![
                StrainSample {
                    offset_secs: 0,
                    heart_rate: 104,
                },
                StrainSample {
                    offset_secs: 5,
                    heart_rate: 121,
                },
            ],
        }],
    };

    export::json::export_bundle(&bundle, &path).unwrap();

    let manager = ImportManager::new();
    let batch = manager.import_file(&path).unwrap();

    assert_eq!(batch.metrics, bundle.metrics);
    assert_eq!(batch.sessions, bundle.sessions);
    assert_eq!(batch.traces, bundle.traces);
}

#[test]
fn test_csv_metrics_export_reimports() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("metrics.csv");

    let metrics = vec![
        DailyMetrics {
            date: day(10),
            recovery_score: Some(77.0),
            strain: Some(12.25),
            hrv_rmssd: Some(61.5),
            sleep_performance: None,
            resting_heart_rate: Some(50.0),
        },
        DailyMetrics {
            date: day(11),
            recovery_score: Some(58.0),
            strain: None,
            hrv_rmssd: Some(57.0),
            sleep_performance: Some(88.0),
            resting_heart_rate: None,
        },
    ];

    export::csv::export_metrics(&metrics, &path).unwrap();

    let manager = ImportManager::new();
    let batch = manager.import_file(&path).unwrap();

    assert_eq!(batch.metrics, metrics);
}

#[test]
fn test_csv_sessions_export_reimports_rep_lists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions.csv");

    let mut session = adaptrs::models::ProgressionSession::new(
        "Overhead Press",
        day(12),
        TrainingParameters::default(),
    );
    session.completed_reps = vec![8, 8, 6];
    session.perceived_effort = Some(9.0);

    export::csv::export_sessions(std::slice::from_ref(&session), &path).unwrap();

    let manager = ImportManager::new();
    let batch = manager.import_file(&path).unwrap();

    assert_eq!(batch.sessions.len(), 1);
    let back = &batch.sessions[0];
    assert_eq!(back.exercise, session.exercise);
    assert_eq!(back.date, session.date);
    assert_eq!(back.planned, session.planned);
    assert_eq!(back.completed_reps, session.completed_reps);
    assert_eq!(back.perceived_effort, session.perceived_effort);
}

#[test]
fn test_unsupported_extension_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(&dir, "notes.txt", "not training data");

    let manager = ImportManager::new();
    assert!(!manager.can_import_file(&path));
    assert!(manager.import_file(&path).is_err());
}

#[test]
fn test_collect_importable_files_filters_and_sorts() {
    let dir = TempDir::new().unwrap();
    write_fixture(&dir, "b_metrics.csv", "Date,Recovery\n2024-04-01,70\n");
    write_fixture(&dir, "a_bundle.json", r#"{"metrics": []}"#);
    write_fixture(&dir, "readme.txt", "ignored");

    let manager = ImportManager::new();
    let files = manager.collect_importable_files(dir.path()).unwrap();

    assert_eq!(files.len(), 2);
    assert!(files[0].ends_with("a_bundle.json"));
    assert!(files[1].ends_with("b_metrics.csv"));
}

#[test]
fn test_file_sha256_fingerprints_content() {
    let dir = TempDir::new().unwrap();
    let first = write_fixture(&dir, "one.csv", "Date,Recovery\n2024-04-01,70\n");
    let same = write_fixture(&dir, "two.csv", "Date,Recovery\n2024-04-01,70\n");
    let different = write_fixture(&dir, "three.csv", "Date,Recovery\n2024-04-01,71\n");

    let hash_a = file_sha256(&first).unwrap();
    let hash_b = file_sha256(&same).unwrap();
    let hash_c = file_sha256(&different).unwrap();

    assert_eq!(hash_a, hash_b);
    assert_ne!(hash_a, hash_c);
    assert_eq!(hash_a.len(), 64);
}
