//! Storage configuration types.

use serde::Deserialize;

/// Default SQLite database path.
pub const DEFAULT_SQLITE_PATH: &str = "data/checkpoints.db";
/// Default checkpoint file path for the file backend.
pub const DEFAULT_FILE_PATH: &str = "data/checkpoints.json";
/// Default Redis URL.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Storage type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Memory,
    File,
    #[default]
    Sqlite,
    Redis,
}

/// Storage configuration (discriminated union).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type discriminator.
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    /// File-specific configuration.
    pub file: FileConfig,
    /// SQLite-specific configuration.
    pub sqlite: SqliteConfig,
    /// Redis-specific configuration.
    pub redis: RedisConfig,
}

/// File backend configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Path of the JSON checkpoint file.
    pub path: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_FILE_PATH.to_string(),
        }
    }
}

/// SQLite-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// Database file path. Created if missing.
    pub path: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_SQLITE_PATH.to_string(),
        }
    }
}

/// Redis-specific configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix. Defaults to "checkpoint" when unset.
    pub key_prefix: Option<String>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REDIS_URL.to_string(),
            key_prefix: None,
        }
    }
}
