//! Unified error hierarchy for adaptrs
//!
//! Structured error types for the store, importers/exporters, and
//! calculation layers, with severity mapping into the tracing system.
//! The recommendation calculators themselves do not produce errors;
//! they substitute safe defaults so callers always get a usable result.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all adaptrs operations
#[derive(Debug, Error)]
pub enum AdaptError {
    /// Store operation errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Payload serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Compressed blob handling failed
    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    /// Record not found
    #[error("Record not found: {table}.{key}")]
    NotFound { table: String, key: String },

    /// Duplicate entry
    #[error("Duplicate entry: {table}.{key}")]
    Duplicate { table: String, key: String },
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// Unsupported format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Missing required data
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// Invalid data structure
    #[error("Invalid data structure: {reason}")]
    InvalidStructure { reason: String },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },

    /// File IO failure during import/export
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Insufficient data for calculation
    #[error("Insufficient data for {calculation}: {reason}")]
    InsufficientData { calculation: String, reason: String },

    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Training parameters fail their own invariants
    #[error("Invalid training parameters: {reason}")]
    InvalidParameters { reason: String },
}

/// Result type alias for adaptrs operations
pub type Result<T> = std::result::Result<T, AdaptError>;

impl AdaptError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdaptError::Io(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdaptError::Store(StoreError::NotFound { .. }) => ErrorSeverity::Warning,
            AdaptError::Store(StoreError::Duplicate { .. }) => ErrorSeverity::Warning,
            AdaptError::Validation(_) => ErrorSeverity::Warning,
            AdaptError::Store(_) => ErrorSeverity::Error,
            AdaptError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AdaptError::Store(StoreError::NotFound { table, key }) => {
                format!("No {} record found for {}", table, key)
            }
            AdaptError::Store(StoreError::Duplicate { table, key }) => {
                format!("Already recorded: {} ({})", key, table)
            }
            AdaptError::ImportExport(ImportExportError::UnsupportedFormat { format }) => {
                format!(
                    "Unsupported file format '{}'. Supported formats: csv, json.",
                    format
                )
            }
            AdaptError::Calculation(CalculationError::InsufficientData {
                calculation, ..
            }) => {
                format!(
                    "Not enough data to calculate {}. Import more history first.",
                    calculation
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
