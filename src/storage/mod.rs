//! Storage implementations.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checkpoint::SequencePosition;
use crate::config::{StorageConfig, StorageType};

mod checkpoint_store;
pub mod file;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod schema;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "redis")]
pub mod redis;

pub use checkpoint_store::CheckpointStore;
pub use file::FileCheckpointStore;
pub use memory::{Fault, MemoryCheckpointStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteCheckpointStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisCheckpointStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Fencing token rejected for partition {partition}: offered {offered}, stored {stored}")]
    FencingRejected {
        partition: String,
        offered: FencingToken,
        stored: FencingToken,
    },

    #[error("Backend throttled request: {0}")]
    Throttled(String),

    #[error("Backend unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("Stored checkpoint could not be encoded or decoded: {0}")]
    Codec(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::DependencyUnavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}

/// Ownership epoch proving a worker currently holds a partition's lease.
///
/// Larger tokens supersede smaller ones. Tokens are issued by the external
/// lease manager; this crate only compares them.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FencingToken(u64);

impl FencingToken {
    pub const fn new(epoch: u64) -> Self {
        Self(epoch)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for FencingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted checkpoint for one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Last committed position.
    pub position: SequencePosition,
    /// Token of the writer that committed it.
    pub fencing_token: FencingToken,
}

impl CheckpointRecord {
    pub fn new(position: SequencePosition, fencing_token: FencingToken) -> Self {
        Self {
            position,
            fencing_token,
        }
    }
}

/// Initialize the checkpoint store selected by configuration.
pub async fn init_store(
    config: &StorageConfig,
) -> std::result::Result<Arc<dyn CheckpointStore>, Box<dyn std::error::Error + Send + Sync>> {
    info!(storage_type = ?config.storage_type, "Initializing checkpoint store");

    match config.storage_type {
        StorageType::Memory => Ok(Arc::new(MemoryCheckpointStore::new())),
        StorageType::File => Ok(Arc::new(FileCheckpointStore::new(&config.file.path))),
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            if let Some(parent) = std::path::Path::new(&config.sqlite.path).parent() {
                std::fs::create_dir_all(parent)?;
            }

            let pool =
                sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", config.sqlite.path))
                    .await?;

            let store = SqliteCheckpointStore::new(pool);
            store.init().await?;

            info!(path = %config.sqlite.path, "Connected to SQLite for checkpoints");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "sqlite"))]
        StorageType::Sqlite => {
            tracing::error!("SQLite storage requested but 'sqlite' feature is not enabled");
            Err("SQLite feature not enabled".into())
        }
        #[cfg(feature = "redis")]
        StorageType::Redis => {
            let store =
                RedisCheckpointStore::new(&config.redis.url, config.redis.key_prefix.as_deref())
                    .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        StorageType::Redis => {
            tracing::error!("Redis storage requested but 'redis' feature is not enabled");
            Err("Redis feature not enabled".into())
        }
    }
}
