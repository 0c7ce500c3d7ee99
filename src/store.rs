//! SQLite-backed persistence for metrics, sessions and recommendations
//!
//! Daily metrics and recommendations key on date. Intraday heart-rate
//! traces are bincode-serialized and gzip-compressed before storage,
//! one blob per day. Import dedup hashes live here too.

use chrono::{Duration, NaiveDate};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

use crate::deload::TrainingPhase;
use crate::error::StoreError;
use crate::models::{DailyMetrics, DailyRecommendation, ProgressionSession, StrainSample};

/// Compressed intraday heart-rate trace for one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedSamples {
    pub compressed_data: Vec<u8>,
    pub original_size: usize,
    pub sample_count: usize,
}

impl CompressedSamples {
    /// Compress a day of samples
    pub fn compress(samples: &[StrainSample]) -> Result<Self, StoreError> {
        let serialized = bincode::serialize(samples)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let original_size = serialized.len();

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&serialized)?;
        let compressed_data = encoder.finish()?;

        Ok(Self {
            compressed_data,
            original_size,
            sample_count: samples.len(),
        })
    }

    /// Decompress back to samples
    pub fn decompress(&self) -> Result<Vec<StrainSample>, StoreError> {
        let mut decoder = GzDecoder::new(self.compressed_data.as_slice());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)?;

        let samples: Vec<StrainSample> = bincode::deserialize(&decompressed)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(samples)
    }

    /// Compression ratio (original size / compressed size)
    pub fn compression_ratio(&self) -> f64 {
        self.original_size as f64 / self.compressed_data.len() as f64
    }
}

/// Filters for session queries
#[derive(Debug, Clone, Default)]
pub struct SessionFilters {
    pub exercise: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Store statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub metric_days: usize,
    pub session_count: usize,
    pub recommendation_count: usize,
    pub sample_days: usize,
    pub total_original_size: usize,
    pub total_compressed_size: usize,
    pub compression_ratio: f64,
}

/// Database connection and schema management
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Create or open a store at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        let mut store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let mut store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&mut self) -> Result<(), StoreError> {
        // WAL keeps readers unblocked during imports
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "cache_size", 10000)?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS daily_metrics (
                date TEXT PRIMARY KEY,
                recovery_score REAL,
                strain REAL,
                hrv_rmssd REAL,
                sleep_performance REAL,
                resting_heart_rate REAL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                exercise TEXT NOT NULL,
                date TEXT NOT NULL,
                planned TEXT NOT NULL,
                completed_reps TEXT NOT NULL,
                perceived_effort REAL,
                recovery_before REAL,
                strain_after REAL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS recommendations (
                date TEXT PRIMARY KEY,
                intensity TEXT NOT NULL,
                injury_risk TEXT NOT NULL,
                should_stop INTEGER NOT NULL,
                should_deload INTEGER NOT NULL,
                payload TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS training_phase (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                payload TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS intraday_samples (
                date TEXT PRIMARY KEY,
                compressed_data BLOB NOT NULL,
                original_size INTEGER NOT NULL,
                sample_count INTEGER NOT NULL,
                compression_ratio REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS import_hashes (
                file_hash TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                imported_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_exercise_date ON sessions (exercise, date)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions (date)",
            [],
        )?;

        Ok(())
    }

    /// Insert or merge one day of metrics.
    ///
    /// Wearable exports often split metrics across files, so new readings
    /// merge into any existing row: a present value wins over a stored
    /// one, a missing value leaves the stored one alone.
    pub fn upsert_metrics(&mut self, metrics: &DailyMetrics) -> Result<(), StoreError> {
        let merged = match self.metrics_for(metrics.date)? {
            Some(existing) => DailyMetrics {
                date: metrics.date,
                recovery_score: metrics.recovery_score.or(existing.recovery_score),
                strain: metrics.strain.or(existing.strain),
                hrv_rmssd: metrics.hrv_rmssd.or(existing.hrv_rmssd),
                sleep_performance: metrics.sleep_performance.or(existing.sleep_performance),
                resting_heart_rate: metrics.resting_heart_rate.or(existing.resting_heart_rate),
            },
            None => metrics.clone(),
        };

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO daily_metrics (
                date, recovery_score, strain, hrv_rmssd, sleep_performance,
                resting_heart_rate, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, CURRENT_TIMESTAMP)
            "#,
            params![
                merged.date.to_string(),
                merged.recovery_score,
                merged.strain,
                merged.hrv_rmssd,
                merged.sleep_performance,
                merged.resting_heart_rate,
            ],
        )?;

        Ok(())
    }

    /// Load metrics for one date
    pub fn metrics_for(&self, date: NaiveDate) -> Result<Option<DailyMetrics>, StoreError> {
        let metrics = self
            .conn
            .query_row(
                r#"
                SELECT date, recovery_score, strain, hrv_rmssd, sleep_performance,
                       resting_heart_rate
                FROM daily_metrics
                WHERE date = ?1
                "#,
                params![date.to_string()],
                metrics_from_row,
            )
            .optional()?;

        Ok(metrics)
    }

    /// Load metrics in a date range, oldest first
    pub fn metrics_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyMetrics>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT date, recovery_score, strain, hrv_rmssd, sleep_performance,
                   resting_heart_rate
            FROM daily_metrics
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC
            "#,
        )?;

        let rows = stmt.query_map(
            params![start.to_string(), end.to_string()],
            metrics_from_row,
        )?;

        let mut metrics = Vec::new();
        for row in rows {
            metrics.push(row?);
        }

        Ok(metrics)
    }

    /// Trailing metric window ending at `as_of`, inclusive
    pub fn recent_metrics(
        &self,
        as_of: NaiveDate,
        days: i64,
    ) -> Result<Vec<DailyMetrics>, StoreError> {
        self.metrics_range(as_of - Duration::days(days.max(1) - 1), as_of)
    }

    /// Most recent metric row, if any
    pub fn latest_metrics(&self) -> Result<Option<DailyMetrics>, StoreError> {
        let metrics = self
            .conn
            .query_row(
                r#"
                SELECT date, recovery_score, strain, hrv_rmssd, sleep_performance,
                       resting_heart_rate
                FROM daily_metrics
                ORDER BY date DESC
                LIMIT 1
                "#,
                [],
                metrics_from_row,
            )
            .optional()?;

        Ok(metrics)
    }

    /// HRV readings in the trailing window, oldest first.
    ///
    /// Feeds baseline construction, so only rows with a reading count.
    pub fn hrv_history(&self, as_of: NaiveDate, days: i64) -> Result<Vec<f64>, StoreError> {
        let start = as_of - Duration::days(days.max(1) - 1);
        let mut stmt = self.conn.prepare(
            r#"
            SELECT hrv_rmssd FROM daily_metrics
            WHERE date >= ?1 AND date <= ?2 AND hrv_rmssd IS NOT NULL
            ORDER BY date ASC
            "#,
        )?;

        let rows = stmt.query_map(params![start.to_string(), as_of.to_string()], |row| {
            row.get::<_, f64>(0)
        })?;

        let mut readings = Vec::new();
        for row in rows {
            readings.push(row?);
        }

        Ok(readings)
    }

    /// Store a completed session. Duplicate IDs are rejected.
    pub fn store_session(&mut self, session: &ProgressionSession) -> Result<(), StoreError> {
        let exists: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE id = ?1",
            params![session.id],
            |row| row.get(0),
        )?;
        if exists > 0 {
            return Err(StoreError::Duplicate {
                table: "sessions".to_string(),
                key: session.id.clone(),
            });
        }

        let planned = serde_json::to_string(&session.planned)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let completed = serde_json::to_string(&session.completed_reps)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn.execute(
            r#"
            INSERT INTO sessions (
                id, exercise, date, planned, completed_reps,
                perceived_effort, recovery_before, strain_after
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                session.id,
                session.exercise,
                session.date.to_string(),
                planned,
                completed,
                session.perceived_effort,
                session.recovery_before,
                session.strain_after,
            ],
        )?;

        Ok(())
    }

    /// Query sessions with filters, oldest first
    pub fn query_sessions(
        &self,
        filters: &SessionFilters,
    ) -> Result<Vec<ProgressionSession>, StoreError> {
        let mut conditions = Vec::new();
        let mut bound = Vec::new();

        if let Some(ref exercise) = filters.exercise {
            conditions.push("LOWER(exercise) = LOWER(?)".to_string());
            bound.push(exercise.clone());
        }
        if let Some(start) = filters.start_date {
            conditions.push("date >= ?".to_string());
            bound.push(start.to_string());
        }
        if let Some(end) = filters.end_date {
            conditions.push("date <= ?".to_string());
            bound.push(end.to_string());
        }

        let mut query = String::from(
            "SELECT id, exercise, date, planned, completed_reps, \
             perceived_effort, recovery_before, strain_after FROM sessions",
        );
        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }
        query.push_str(" ORDER BY date ASC");
        if let Some(limit) = filters.limit {
            query.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(bound.iter()), session_from_row)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(row?);
        }

        Ok(sessions)
    }

    /// Store or replace the recommendation for a date
    pub fn store_recommendation(
        &mut self,
        recommendation: &DailyRecommendation,
    ) -> Result<(), StoreError> {
        let payload = serde_json::to_string(recommendation)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO recommendations (
                date, intensity, injury_risk, should_stop, should_deload,
                payload, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, CURRENT_TIMESTAMP)
            "#,
            params![
                recommendation.date.to_string(),
                recommendation.intensity.as_str(),
                recommendation.injury_risk.as_str(),
                recommendation.should_stop,
                recommendation.should_deload,
                payload,
            ],
        )?;

        Ok(())
    }

    /// Load the recommendation stored for one date
    pub fn recommendation_for(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailyRecommendation>, StoreError> {
        let recommendation = self
            .conn
            .query_row(
                "SELECT payload FROM recommendations WHERE date = ?1",
                params![date.to_string()],
                |row| decode_json(0, row.get::<_, String>(0)?),
            )
            .optional()?;

        Ok(recommendation)
    }

    /// Load stored recommendations in a date range, oldest first
    pub fn recommendations_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRecommendation>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT payload FROM recommendations
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC
            "#,
        )?;

        let rows = stmt.query_map(params![start.to_string(), end.to_string()], |row| {
            decode_json(0, row.get::<_, String>(0)?)
        })?;

        let mut recommendations = Vec::new();
        for row in rows {
            recommendations.push(row?);
        }

        Ok(recommendations)
    }

    /// Load the current training phase. Defaults to Normal when unset.
    pub fn load_phase(&self) -> Result<TrainingPhase, StoreError> {
        let phase = self
            .conn
            .query_row(
                "SELECT payload FROM training_phase WHERE id = 1",
                [],
                |row| decode_json(0, row.get::<_, String>(0)?),
            )
            .optional()?;

        Ok(phase.unwrap_or_default())
    }

    /// Persist the current training phase
    pub fn save_phase(&mut self, phase: &TrainingPhase) -> Result<(), StoreError> {
        let payload = serde_json::to_string(phase)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO training_phase (id, payload, updated_at)
            VALUES (1, ?1, CURRENT_TIMESTAMP)
            "#,
            params![payload],
        )?;

        Ok(())
    }

    /// Store a compressed intraday trace, replacing any existing one
    pub fn store_samples(
        &mut self,
        date: NaiveDate,
        samples: &[StrainSample],
    ) -> Result<(), StoreError> {
        let compressed = CompressedSamples::compress(samples)?;

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO intraday_samples (
                date, compressed_data, original_size, sample_count, compression_ratio
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                date.to_string(),
                compressed.compressed_data,
                compressed.original_size,
                compressed.sample_count,
                compressed.compression_ratio(),
            ],
        )?;

        Ok(())
    }

    /// Load and decompress the intraday trace for one date
    pub fn load_samples(&self, date: NaiveDate) -> Result<Option<Vec<StrainSample>>, StoreError> {
        let blob = self
            .conn
            .query_row(
                "SELECT compressed_data FROM intraday_samples WHERE date = ?1",
                params![date.to_string()],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;

        match blob {
            Some(compressed_data) => {
                let compressed = CompressedSamples {
                    compressed_data,
                    original_size: 0,
                    sample_count: 0,
                };
                Ok(Some(compressed.decompress()?))
            }
            None => Ok(None),
        }
    }

    /// Load and decompress every trace in a date range, oldest first
    pub fn samples_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Vec<StrainSample>)>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT date, compressed_data FROM intraday_samples
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date ASC
            "#,
        )?;

        let rows = stmt.query_map(params![start.to_string(), end.to_string()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut traces = Vec::new();
        for row in rows {
            let (raw_date, compressed_data) = row?;
            let compressed = CompressedSamples {
                compressed_data,
                original_size: 0,
                sample_count: 0,
            };
            traces.push((decode_date(0, raw_date)?, compressed.decompress()?));
        }

        Ok(traces)
    }

    /// Check whether a file hash was imported before
    pub fn is_file_imported(&self, file_hash: &str) -> Result<bool, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM import_hashes WHERE file_hash = ?1",
            params![file_hash],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    /// Record a file hash after a successful import
    pub fn mark_file_imported(&mut self, file_hash: &str, file_name: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO import_hashes (file_hash, file_name) VALUES (?1, ?2)",
            params![file_hash, file_name],
        )?;

        Ok(())
    }

    /// Get store statistics
    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let metric_days: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM daily_metrics", [], |row| row.get(0))?;
        let session_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        let recommendation_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM recommendations", [], |row| row.get(0))?;
        let sample_days: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM intraday_samples", [], |row| row.get(0))?;

        let (total_original_size, total_compressed_size): (i64, i64) = self.conn.query_row(
            "SELECT SUM(original_size), SUM(LENGTH(compressed_data)) FROM intraday_samples",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                    row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                ))
            },
        )?;

        let compression_ratio = if total_compressed_size > 0 {
            total_original_size as f64 / total_compressed_size as f64
        } else {
            0.0
        };

        Ok(StoreStats {
            metric_days: metric_days as usize,
            session_count: session_count as usize,
            recommendation_count: recommendation_count as usize,
            sample_days: sample_days as usize,
            total_original_size: total_original_size as usize,
            total_compressed_size: total_compressed_size as usize,
            compression_ratio,
        })
    }
}

fn metrics_from_row(row: &Row) -> rusqlite::Result<DailyMetrics> {
    Ok(DailyMetrics {
        date: decode_date(0, row.get::<_, String>(0)?)?,
        recovery_score: row.get(1)?,
        strain: row.get(2)?,
        hrv_rmssd: row.get(3)?,
        sleep_performance: row.get(4)?,
        resting_heart_rate: row.get(5)?,
    })
}

fn session_from_row(row: &Row) -> rusqlite::Result<ProgressionSession> {
    Ok(ProgressionSession {
        id: row.get(0)?,
        exercise: row.get(1)?,
        date: decode_date(2, row.get::<_, String>(2)?)?,
        planned: decode_json(3, row.get::<_, String>(3)?)?,
        completed_reps: decode_json(4, row.get::<_, String>(4)?)?,
        perceived_effort: row.get(5)?,
        recovery_before: row.get(6)?,
        strain_after: row.get(7)?,
    })
}

fn decode_date(idx: usize, raw: String) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn decode_json<T: DeserializeOwned>(idx: usize, raw: String) -> rusqlite::Result<T> {
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrainingParameters;
    use crate::sample;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_metrics_roundtrip_and_merge() {
        let mut store = Store::open_in_memory().unwrap();

        let mut first = DailyMetrics::new(date(1));
        first.recovery_score = Some(72.0);
        store.upsert_metrics(&first).unwrap();

        // Second file for the same day carries strain only
        let mut second = DailyMetrics::new(date(1));
        second.strain = Some(13.4);
        store.upsert_metrics(&second).unwrap();

        let merged = store.metrics_for(date(1)).unwrap().unwrap();
        assert_eq!(merged.recovery_score, Some(72.0));
        assert_eq!(merged.strain, Some(13.4));
        assert_eq!(merged.hrv_rmssd, None);
    }

    #[test]
    fn test_metrics_range_is_ordered() {
        let mut store = Store::open_in_memory().unwrap();
        for day in [3, 1, 2] {
            let mut m = DailyMetrics::new(date(day));
            m.recovery_score = Some(f64::from(day) * 10.0);
            store.upsert_metrics(&m).unwrap();
        }

        let range = store.metrics_range(date(1), date(3)).unwrap();
        assert_eq!(range.len(), 3);
        assert_eq!(range[0].date, date(1));
        assert_eq!(range[2].date, date(3));

        let recent = store.recent_metrics(date(3), 2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, date(2));
    }

    #[test]
    fn test_session_storage_and_duplicate_rejection() {
        let mut store = Store::open_in_memory().unwrap();
        let session = ProgressionSession::new("Squat", date(5), TrainingParameters::default());

        store.store_session(&session).unwrap();
        let err = store.store_session(&session).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));

        let loaded = store.query_sessions(&SessionFilters::default()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], session);
    }

    #[test]
    fn test_session_filters() {
        let mut store = Store::open_in_memory().unwrap();
        let planned = TrainingParameters::default();

        for (exercise, day) in [("Squat", 1), ("Bench", 2), ("Squat", 3)] {
            let mut s = ProgressionSession::new(exercise, date(day), planned.clone());
            s.completed_reps = vec![8, 8, 8];
            store.store_session(&s).unwrap();
        }

        let squats = store
            .query_sessions(&SessionFilters {
                exercise: Some("squat".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(squats.len(), 2);

        let windowed = store
            .query_sessions(&SessionFilters {
                start_date: Some(date(2)),
                end_date: Some(date(3)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(windowed.len(), 2);
        assert_eq!(windowed[0].exercise, "Bench");
    }

    #[test]
    fn test_recommendation_roundtrip() {
        let mut store = Store::open_in_memory().unwrap();
        let engine = crate::engine::AdaptiveEngine::new();

        let mut metrics = DailyMetrics::new(date(7));
        metrics.recovery_score = Some(80.0);
        let rec = engine.recommend(&metrics, None, &[], &TrainingPhase::Normal, None);

        store.store_recommendation(&rec).unwrap();
        let loaded = store.recommendation_for(date(7)).unwrap().unwrap();
        assert_eq!(loaded.intensity, rec.intensity);
        assert_eq!(loaded.rest_multiplier, rec.rest_multiplier);

        let range = store.recommendations_range(date(1), date(30)).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_phase_defaults_to_normal() {
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(store.load_phase().unwrap(), TrainingPhase::Normal);

        let phase = TrainingPhase::Deload {
            started_on: date(10),
        };
        store.save_phase(&phase).unwrap();
        assert_eq!(store.load_phase().unwrap(), phase);
    }

    #[test]
    fn test_samples_compress_roundtrip() {
        let mut store = Store::open_in_memory().unwrap();
        let samples = sample::intraday_samples(1800, 42);

        store.store_samples(date(9), &samples).unwrap();
        let loaded = store.load_samples(date(9)).unwrap().unwrap();
        assert_eq!(loaded, samples);

        assert!(store.load_samples(date(10)).unwrap().is_none());

        let stats = store.stats().unwrap();
        assert_eq!(stats.sample_days, 1);
        assert!(stats.compression_ratio > 1.0);
    }

    #[test]
    fn test_import_hash_dedup() {
        let mut store = Store::open_in_memory().unwrap();
        assert!(!store.is_file_imported("abc123").unwrap());

        store.mark_file_imported("abc123", "metrics.csv").unwrap();
        assert!(store.is_file_imported("abc123").unwrap());
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut store = Store::new(&path).unwrap();
            let mut m = DailyMetrics::new(date(1));
            m.recovery_score = Some(50.0);
            store.upsert_metrics(&m).unwrap();
        }

        let store = Store::new(&path).unwrap();
        assert!(store.metrics_for(date(1)).unwrap().is_some());
    }
}
