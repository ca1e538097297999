//! CheckpointStore trait definition.

use async_trait::async_trait;

use super::{CheckpointRecord, FencingToken, Result};
use crate::checkpoint::SequencePosition;

/// Interface for durable checkpoint persistence.
///
/// Maps a partition id to the last committed position and the fencing token
/// of the writer that committed it. The store owns the committed state;
/// callers re-read it rather than caching.
///
/// # Conditional writes
///
/// `conditional_write` succeeds only when no record exists or the stored
/// token is less than or equal to the offered one. On success the stored
/// token is replaced by the offered token. A stale writer gets
/// [`StoreError::FencingRejected`](super::StoreError::FencingRejected).
/// The fencing comparison is the only serialization mechanism for
/// contested writes to the same partition.
///
/// Stores do not validate positions and never retry.
///
/// # Implementations
///
/// - `MemoryCheckpointStore`: In-process map, with fault injection for tests
/// - `FileCheckpointStore`: JSON file replaced atomically
/// - `SqliteCheckpointStore`: SQLite storage
/// - `RedisCheckpointStore`: Redis hashes updated by a compare-and-set script
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Get the committed record for a partition.
    ///
    /// Returns `None` if nothing has been committed yet.
    async fn read(&self, partition_id: &str) -> Result<Option<CheckpointRecord>>;

    /// Store `position` for a partition if `fencing_token` is still current.
    async fn conditional_write(
        &self,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<()>;
}
