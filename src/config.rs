use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::classifier::ClassifierThresholds;
use crate::deload::DeloadConfig;
use crate::engine::{EngineConfig, SafetyLimits};
use crate::progression::ProgressionConfig;
use crate::rest::RestMultipliers;
use crate::strain::StrainConfig;

/// Main application configuration
///
/// Every engine tunable is exposed as its own TOML section so a user can
/// override a single threshold without restating the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file metadata
    pub metadata: ConfigMetadata,

    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,

    /// Readiness classifier thresholds
    #[serde(default)]
    pub classifier: ClassifierThresholds,

    /// Rest-period multipliers per intensity
    #[serde(default)]
    pub rest: RestMultipliers,

    /// Strain targets and deload ceiling factor
    #[serde(default)]
    pub strain: StrainConfig,

    /// Deload detection windows and thresholds
    #[serde(default)]
    pub deload: DeloadConfig,

    /// Progression evaluation windows and thresholds
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Hard limits on parameter changes
    #[serde(default)]
    pub safety: SafetyLimits,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Data directory path
    pub data_dir: PathBuf,

    /// Athlete maximum heart rate, used for strain accumulation
    pub max_heart_rate: u16,

    /// Athlete resting heart rate, used for strain accumulation
    pub resting_heart_rate: u16,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            data_dir: PathBuf::from("./data"),
            max_heart_rate: 190,
            resting_heart_rate: 60,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            settings: AppSettings::default(),
            classifier: ClassifierThresholds::default(),
            rest: RestMultipliers::default(),
            strain: StrainConfig::default(),
            deload: DeloadConfig::default(),
            progression: ProgressionConfig::default(),
            safety: SafetyLimits::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".adaptrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults.
    ///
    /// A missing file is normal and falls back silently. A file that
    /// exists but cannot be parsed is reported before falling back, so a
    /// typo in one section does not vanish without trace.
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        if !config_path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!(
                    "Ignoring unreadable config {} ({err:#}); using defaults",
                    config_path.display()
                );
                Self::default()
            }
        }
    }

    /// Save configuration to default location
    pub fn save_default(&mut self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to_file(config_path)
    }

    /// Default database path under the configured data directory
    pub fn database_path(&self) -> PathBuf {
        self.settings.data_dir.join("adaptrs.db")
    }

    /// Assemble the engine configuration from the tunable sections
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            thresholds: self.classifier.clone(),
            rest: self.rest.clone(),
            strain: self.strain.clone(),
            deload: self.deload.clone(),
            progression: self.progression.clone(),
            safety: self.safety.clone(),
        }
    }
}
