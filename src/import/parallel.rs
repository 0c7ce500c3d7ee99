//! Parallel batch imports using rayon
//!
//! Processes many files concurrently with progress tracking and
//! per-file error collection. Failed files never abort the batch
//! unless configured to.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use super::{ImportBatch, ImportManager};

/// Configuration for parallel import operations
#[derive(Debug, Clone)]
pub struct ParallelImportConfig {
    /// Number of threads for parallel processing (None = rayon default)
    pub num_threads: Option<usize>,
    /// Show progress bar during import
    pub show_progress: bool,
    /// Continue processing when a file fails
    pub continue_on_error: bool,
}

impl Default for ParallelImportConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            show_progress: true,
            continue_on_error: true,
        }
    }
}

/// Result of a single file import in parallel context
#[derive(Debug, Clone)]
pub struct FileImportResult {
    /// Path to the file that was processed
    pub file_path: PathBuf,
    /// Records imported from this file
    pub batch: ImportBatch,
    /// Duration in milliseconds for this file
    pub duration_ms: u128,
    /// Whether import succeeded
    pub success: bool,
    /// Error message if import failed
    pub error: Option<String>,
}

/// Summary of a parallel import operation
#[derive(Debug, Clone)]
pub struct ParallelImportSummary {
    /// Total files processed
    pub total_files: usize,
    /// Files successfully imported
    pub successful_files: usize,
    /// Files with errors
    pub failed_files: usize,
    /// Metric days imported
    pub total_metric_days: usize,
    /// Sessions imported
    pub total_sessions: usize,
    /// Intraday traces imported
    pub total_traces: usize,
    /// Total duration in milliseconds
    pub total_duration_ms: u128,
    /// Per-file results
    pub results: Vec<FileImportResult>,
    /// Errors encountered
    pub errors: Vec<(PathBuf, String)>,
}

impl ParallelImportSummary {
    fn empty() -> Self {
        Self {
            total_files: 0,
            successful_files: 0,
            failed_files: 0,
            total_metric_days: 0,
            total_sessions: 0,
            total_traces: 0,
            total_duration_ms: 0,
            results: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Get throughput (files per second)
    pub fn throughput_files_per_sec(&self) -> f64 {
        if self.total_duration_ms == 0 {
            return 0.0;
        }
        (self.successful_files as f64 / self.total_duration_ms as f64) * 1000.0
    }

    /// Check if import was completely successful
    pub fn is_fully_successful(&self) -> bool {
        self.failed_files == 0
    }

    /// Get human-readable summary
    pub fn to_string_pretty(&self) -> String {
        format!(
            "Import Summary\n  \
             Total Files: {}\n  \
             Successful: {}\n  \
             Failed: {}\n  \
             Metric Days: {}\n  \
             Sessions: {}\n  \
             Intraday Traces: {}\n  \
             Total Time: {:.2}s\n  \
             Throughput: {:.2} files/sec",
            self.total_files,
            self.successful_files,
            self.failed_files,
            self.total_metric_days,
            self.total_sessions,
            self.total_traces,
            self.total_duration_ms as f64 / 1000.0,
            self.throughput_files_per_sec()
        )
    }
}

/// Parallel import manager
pub struct ParallelImporter {
    pub config: ParallelImportConfig,
    manager: ImportManager,
}

impl ParallelImporter {
    /// Create new parallel importer with default config
    pub fn new() -> Self {
        Self::with_config(ParallelImportConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(config: ParallelImportConfig) -> Self {
        Self {
            config,
            manager: ImportManager::new(),
        }
    }

    /// Import multiple files in parallel
    pub fn import_files(
        &self,
        file_paths: &[PathBuf],
    ) -> Result<(ImportBatch, ParallelImportSummary)> {
        let start_time = std::time::Instant::now();

        info!("Starting parallel import of {} files", file_paths.len());

        let progress = if self.config.show_progress {
            let pb = ProgressBar::new(file_paths.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        let results = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));

        // A local pool avoids poisoning the global one with a fixed size
        if let Some(num_threads) = self.config.num_threads {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))?;

            pool.install(|| self.process_files_parallel(file_paths, &progress, &results, &errors));
        } else {
            self.process_files_parallel(file_paths, &progress, &results, &errors);
        }

        if let Some(pb) = progress {
            pb.finish_with_message("Complete");
        }

        let total_duration_ms = start_time.elapsed().as_millis();

        let results_vec = match Arc::try_unwrap(results) {
            Ok(m) => m.into_inner().unwrap_or_else(|e| e.into_inner()),
            Err(arc) => arc.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        };
        let errors_vec = match Arc::try_unwrap(errors) {
            Ok(m) => m.into_inner().unwrap_or_else(|e| e.into_inner()),
            Err(arc) => arc.lock().unwrap_or_else(|e| e.into_inner()).clone(),
        };

        let (successful, failed) = results_vec.iter().fold((0, 0), |(s, f), r: &FileImportResult| {
            if r.success {
                (s + 1, f)
            } else {
                (s, f + 1)
            }
        });

        let mut combined = ImportBatch::default();
        for result in &results_vec {
            combined.merge(result.batch.clone());
        }

        let summary = ParallelImportSummary {
            total_files: file_paths.len(),
            successful_files: successful,
            failed_files: failed,
            total_metric_days: combined.metrics.len(),
            total_sessions: combined.sessions.len(),
            total_traces: combined.traces.len(),
            total_duration_ms,
            results: results_vec,
            errors: errors_vec,
        };

        info!("{}", summary.to_string_pretty());

        if !self.config.continue_on_error && !summary.is_fully_successful() {
            let (path, error) = &summary.errors[0];
            anyhow::bail!("Import failed on {}: {}", path.display(), error);
        }

        Ok((combined, summary))
    }

    /// Import all importable files in a directory, in parallel
    pub fn import_directory(
        &self,
        dir_path: &Path,
    ) -> Result<(ImportBatch, ParallelImportSummary)> {
        debug!("Scanning directory for importable files: {:?}", dir_path);

        let files = self.manager.collect_importable_files(dir_path)?;

        if files.is_empty() {
            warn!("No importable files found in {}", dir_path.display());
            return Ok((ImportBatch::default(), ParallelImportSummary::empty()));
        }

        info!("Found {} importable files", files.len());
        self.import_files(&files)
    }

    fn process_files_parallel(
        &self,
        file_paths: &[PathBuf],
        progress: &Option<ProgressBar>,
        results: &Arc<Mutex<Vec<FileImportResult>>>,
        errors: &Arc<Mutex<Vec<(PathBuf, String)>>>,
    ) {
        file_paths.par_iter().for_each_with(
            (progress.clone(), results.clone(), errors.clone()),
            |(pb, res, err), file_path| {
                let file_start = std::time::Instant::now();

                match self.manager.import_file(file_path) {
                    Ok(batch) => {
                        let duration_ms = file_start.elapsed().as_millis();
                        debug!(
                            "Imported {:?} ({} records, {}ms)",
                            file_path,
                            batch.record_count(),
                            duration_ms
                        );

                        let result = FileImportResult {
                            file_path: file_path.clone(),
                            batch,
                            duration_ms,
                            success: true,
                            error: None,
                        };

                        if let Ok(mut r) = res.lock() {
                            r.push(result);
                        }
                    }
                    Err(e) => {
                        let duration_ms = file_start.elapsed().as_millis();
                        let error_msg = e.to_string();
                        warn!("Failed to import {:?}: {} ({}ms)", file_path, error_msg, duration_ms);

                        let result = FileImportResult {
                            file_path: file_path.clone(),
                            batch: ImportBatch::default(),
                            duration_ms,
                            success: false,
                            error: Some(error_msg.clone()),
                        };

                        if let Ok(mut r) = res.lock() {
                            r.push(result);
                        }
                        if let Ok(mut e) = err.lock() {
                            e.push((file_path.clone(), error_msg));
                        }
                    }
                }

                if let Some(p) = pb {
                    p.inc(1);
                }
            },
        );
    }
}

impl Default for ParallelImporter {
    fn default() -> Self {
        Self::new()
    }
}
