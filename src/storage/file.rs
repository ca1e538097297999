//! File-backed CheckpointStore.
//!
//! Persists all partitions of a stream in one JSON document. Every write is a
//! read-modify-write under a lock shared by all stores on the same path in
//! this process, replaced atomically via a temp file and rename. Suitable for
//! single-process deployments; cross-process writers need a backend with real
//! conditional writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::{CheckpointRecord, CheckpointStore, FencingToken, Result, StoreError};
use crate::checkpoint::SequencePosition;

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

/// On-disk document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CheckpointFile {
    /// Version for future format migrations.
    #[serde(default)]
    version: u32,
    /// Committed record per partition id.
    #[serde(default)]
    partitions: HashMap<String, CheckpointRecord>,
}

/// Write lock for `path`, shared by every store opened on it in this process.
fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();

    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(key).or_default().clone()
}

/// Checkpoint store backed by a JSON file.
pub struct FileCheckpointStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileCheckpointStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            write_lock: path_lock(&path),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<CheckpointFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CheckpointFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, file: &CheckpointFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(file)?;

        // Write atomically via temp file
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &json).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn read(&self, partition_id: &str) -> Result<Option<CheckpointRecord>> {
        let file = self.load().await?;
        Ok(file.partitions.get(partition_id).copied())
    }

    async fn conditional_write(
        &self,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut file = self.load().await?;
        if let Some(existing) = file.partitions.get(partition_id) {
            if existing.fencing_token > fencing_token {
                return Err(StoreError::FencingRejected {
                    partition: partition_id.to_string(),
                    offered: fencing_token,
                    stored: existing.fencing_token,
                });
            }
        }

        file.version = FORMAT_VERSION;
        file.partitions.insert(
            partition_id.to_string(),
            CheckpointRecord::new(position, fencing_token),
        );
        self.persist(&file).await?;

        debug!(
            path = %self.path.display(),
            partition = %partition_id,
            position = %position,
            "Flushed checkpoint file"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::new(dir.path().join("absent.json"));
        assert!(store.read("shard-0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints.json");

        {
            let store = FileCheckpointStore::new(&path);
            store
                .conditional_write("shard-0", SequencePosition::at(42, 3), FencingToken::new(2))
                .await
                .unwrap();
        }

        let reopened = FileCheckpointStore::new(&path);
        let record = reopened.read("shard-0").await.unwrap().unwrap();
        assert_eq!(record.position, SequencePosition::at(42, 3));
        assert_eq!(record.fencing_token, FencingToken::new(2));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_codec_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileCheckpointStore::new(&path);
        assert!(matches!(
            store.read("shard-0").await,
            Err(StoreError::Codec(_))
        ));
    }

    #[test]
    fn test_stores_on_same_path_share_write_lock() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints.json");

        let a = FileCheckpointStore::new(&path);
        let b = FileCheckpointStore::new(dir.path().join("./checkpoints.json"));
        let other = FileCheckpointStore::new(dir.path().join("other.json"));

        assert!(Arc::ptr_eq(&a.write_lock, &b.write_lock));
        assert!(!Arc::ptr_eq(&a.write_lock, &other.write_lock));
    }

    #[tokio::test]
    async fn test_stale_writer_on_second_store_cannot_clobber() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoints.json");
        let new_owner = FileCheckpointStore::new(&path);
        let old_owner = FileCheckpointStore::new(&path);

        for i in 0..20u128 {
            let fresh_position = SequencePosition::at(100 + i, 0);
            let (fresh, stale) = tokio::join!(
                new_owner.conditional_write("shard-0", fresh_position, FencingToken::new(2)),
                old_owner.conditional_write(
                    "shard-0",
                    SequencePosition::at(i, 0),
                    FencingToken::new(1)
                ),
            );
            fresh.unwrap();
            if let Err(err) = stale {
                assert!(matches!(err, StoreError::FencingRejected { .. }));
            }

            let record = new_owner.read("shard-0").await.unwrap().unwrap();
            assert_eq!(record.fencing_token, FencingToken::new(2));
            assert_eq!(record.position, fresh_position);
        }
    }

    #[tokio::test]
    async fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/state/checkpoints.json");

        let store = FileCheckpointStore::new(&path);
        store
            .conditional_write("shard-0", SequencePosition::at(1, 0), FencingToken::new(1))
            .await
            .unwrap();
        assert!(path.exists());
    }
}
