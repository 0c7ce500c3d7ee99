use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ImportExportError;

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Result<Self, ImportExportError> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// What a single export call writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportKind {
    Metrics,
    Sessions,
    Recommendations,
    /// Everything in one JSON document
    Bundle,
}

impl ExportKind {
    pub fn from_str(s: &str) -> Result<Self, ImportExportError> {
        match s.to_lowercase().as_str() {
            "metrics" => Ok(ExportKind::Metrics),
            "sessions" => Ok(ExportKind::Sessions),
            "recommendations" | "recs" => Ok(ExportKind::Recommendations),
            "bundle" | "all" => Ok(ExportKind::Bundle),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Date range filter for exports
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| date >= &start);
        let before_end = self.end.map_or(true, |end| date <= &end);
        after_start && before_end
    }

    /// Concrete bounds for store queries.
    ///
    /// Open ends widen to four-digit-year extremes rather than
    /// `NaiveDate::MIN`/`MAX`, whose rendered forms carry a sign prefix
    /// and would misorder the store's text date comparisons.
    pub fn effective_bounds(&self) -> (NaiveDate, NaiveDate) {
        let earliest = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
        let latest = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
        (self.start.unwrap_or(earliest), self.end.unwrap_or(latest))
    }
}
