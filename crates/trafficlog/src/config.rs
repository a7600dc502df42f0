//! Configuration management for trafficlog.
//!
//! Configuration is layered with figment: built-in defaults, then an optional
//! TOML file, then `TRAFFICLOG_` environment variables.

use std::fmt;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::timegrid;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name used under the platform config and data directories.
const APP_DIR_NAME: &str = "trafficlog";

/// Environment variable prefix.
const ENV_PREFIX: &str = "TRAFFICLOG_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables such as `TRAFFICLOG_STORAGE__BACKEND=sqlite`
/// 2. TOML config file at `~/.config/trafficlog/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where datasets are kept.
    pub storage: StorageConfig,
    /// Defaults offered when recording a new survey.
    pub survey: SurveyConfig,
}

/// Which [`DatasetStore`](crate::storage::DatasetStore) implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON document holding every dataset.
    #[default]
    Json,
    /// A `SQLite` database.
    Sqlite,
    /// Nothing persisted.
    Memory,
}

impl StorageBackend {
    /// Default file name for this backend, if it persists anything.
    #[must_use]
    pub fn default_file_name(self) -> Option<&'static str> {
        match self {
            Self::Json => Some("datasets.json"),
            Self::Sqlite => Some("datasets.db"),
            Self::Memory => None,
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        })
    }
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage backend.
    pub backend: StorageBackend,
    /// Path to the dataset file or database.
    /// Defaults to `~/.local/share/trafficlog/datasets.json` (or `.db`).
    pub path: Option<PathBuf>,
}

/// Researcher-side survey defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Start time of the first interval, `HH:MM`.
    pub start_time: String,
    /// Length of each interval in minutes.
    pub interval_minutes: u32,
    /// Number of intervals.
    pub interval_count: u32,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            start_time: "07:00".to_string(),
            interval_minutes: 10,
            interval_count: 8,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(APP_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if let Err(e) = timegrid::parse_time(&self.survey.start_time) {
            return Err(Error::ConfigValidation {
                message: format!("survey.start_time: {e}"),
            });
        }

        if self.survey.interval_minutes == 0 {
            return Err(Error::ConfigValidation {
                message: "survey.interval_minutes must be greater than 0".to_string(),
            });
        }

        if self.survey.interval_count == 0 {
            return Err(Error::ConfigValidation {
                message: "survey.interval_count must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the storage path, resolving the per-backend default if not set.
    ///
    /// The memory backend ignores this path.
    #[must_use]
    pub fn storage_path(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(|| {
            let file_name = self
                .storage
                .backend
                .default_file_name()
                .unwrap_or("datasets");
            Self::default_data_dir().join(file_name)
        })
    }
}
