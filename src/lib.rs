// Library interface for adaptrs modules
// This allows integration tests to access the core functionality

pub mod baseline;
pub mod classifier;
pub mod config;
pub mod deload;
pub mod display;
pub mod engine;
pub mod error;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod progression;
pub mod rest;
pub mod sample;
pub mod store;
pub mod strain;

// Re-export commonly used types for convenience
pub use models::*;
pub use baseline::HrvBaseline;
pub use classifier::{Classification, Classifier, ClassifierThresholds, ReadinessBand};
pub use deload::{DeloadAssessment, DeloadConfig, DeloadDetector, TrainingPhase};
pub use engine::{AdaptiveEngine, EngineConfig, SafetyLimits};
pub use error::{AdaptError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use progression::{ProgressionConfig, ProgressionEvaluator};
pub use rest::{adjust_rest_periods, RestMultipliers};
pub use store::{SessionFilters, Store, StoreStats};
pub use strain::{accumulate_strain, StrainConfig, StrainMonitor, StrainStatus};
