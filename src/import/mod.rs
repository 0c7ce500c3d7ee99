use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::models::{DailyMetrics, ProgressionSession, StrainSample};

pub mod csv;
pub mod json;
pub mod parallel;
pub mod validation;

/// Intraday heart-rate trace for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrace {
    pub date: NaiveDate,
    pub samples: Vec<StrainSample>,
}

/// Parsed content of one or more imported files
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub metrics: Vec<DailyMetrics>,
    pub sessions: Vec<ProgressionSession>,
    pub traces: Vec<DailyTrace>,
}

impl ImportBatch {
    /// Fold another batch into this one
    pub fn merge(&mut self, mut other: ImportBatch) {
        self.metrics.append(&mut other.metrics);
        self.sessions.append(&mut other.sessions);
        self.traces.append(&mut other.traces);
    }

    /// Total records across all record kinds
    pub fn record_count(&self) -> usize {
        self.metrics.len() + self.sessions.len() + self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

/// Trait for importing training data from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import training data from the file
    fn import_file(&self, file_path: &Path) -> Result<ImportBatch>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat + Send + Sync>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat + Send + Sync>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format
    pub fn import_file(&self, file_path: &Path) -> Result<ImportBatch> {
        for importer in &self.importers {
            if importer.can_import(file_path) {
                debug!(
                    file = %file_path.display(),
                    format = importer.get_format_name(),
                    "importing file"
                );
                return importer.import_file(file_path);
            }
        }

        anyhow::bail!("No importer found for file: {}", file_path.display());
    }

    /// Validate a file without keeping the data
    pub fn validate_file(&self, file_path: &Path) -> Result<usize> {
        let batch = self.import_file(file_path)?;
        Ok(batch.record_count())
    }

    /// Check if this manager can import a given file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers
            .iter()
            .any(|importer| importer.can_import(file_path))
    }

    /// Collect all files that can be imported from a directory
    pub fn collect_importable_files(&self, dir_path: &Path) -> Result<Vec<std::path::PathBuf>> {
        let mut files = Vec::new();

        if !dir_path.is_dir() {
            anyhow::bail!("Path is not a directory: {}", dir_path.display());
        }

        for entry in std::fs::read_dir(dir_path)? {
            let entry = entry?;
            let path = entry.path();

            if path.is_file() && self.can_import_file(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA256 fingerprint of a file, for import dedup
pub fn file_sha256(file_path: &Path) -> Result<String> {
    let mut file = File::open(file_path)
        .with_context(|| format!("Failed to open file for hashing: {}", file_path.display()))?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
