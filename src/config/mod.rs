//! Application configuration.
//!
//! Aggregates storage and retry settings into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod retry;
mod storage;

pub use retry::RetryConfig;
pub use storage::{
    FileConfig, RedisConfig, SqliteConfig, StorageConfig, StorageType, DEFAULT_FILE_PATH,
    DEFAULT_REDIS_URL, DEFAULT_SQLITE_PATH,
};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "checkpoint.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "CHECKPOINT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "CHECKPOINT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "CHECKPOINT_LOG";

use serde::Deserialize;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Retry configuration for callers that retry transient failures.
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `checkpoint.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Create config for testing: in-memory storage, fast retries.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                ..StorageConfig::default()
            },
            retry: RetryConfig {
                min_delay_ms: 1,
                max_delay_ms: 5,
                max_times: 3,
                jitter: false,
            },
        }
    }
}
