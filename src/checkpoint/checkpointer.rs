//! Validation and commit of checkpoints against a CheckpointStore.

use std::sync::Arc;

use tracing::{debug, warn};

use super::prepared::{NoOpPreparedCheckpoint, PreparedCheckpoint, StorePreparedCheckpoint};
use super::{CheckpointError, Result, SequencePosition};
use crate::storage::{CheckpointRecord, CheckpointStore, FencingToken};

/// Single authority that turns a position into a durable commit.
///
/// Holds no per-partition state: every call reads the committed record from
/// the store, so a rebalance can never leave a stale cached position behind.
/// Share it as `Arc<Checkpointer>`; prepared checkpoints keep only a weak
/// reference back to it.
pub struct Checkpointer {
    store: Arc<dyn CheckpointStore>,
}

impl std::fmt::Debug for Checkpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkpointer").finish_non_exhaustive()
    }
}

impl Checkpointer {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Durably commit `position` for a partition.
    ///
    /// # Errors
    /// - `InvalidPosition` for sentinel positions
    /// - `Shutdown` if a newer fencing token owns the partition
    /// - `InvalidState` if `position` precedes the committed position
    /// - `Throttling` / `Dependency` for transient backend faults
    ///
    /// Committing the already-committed position succeeds without a write.
    pub async fn checkpoint(
        &self,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<()> {
        let current = self.validate(partition_id, position, fencing_token).await?;

        if current.map(|record| record.position) == Some(position) {
            debug!(
                partition = %partition_id,
                position = %position,
                "Checkpoint already committed, skipping write"
            );
            return Ok(());
        }

        self.store
            .conditional_write(partition_id, position, fencing_token)
            .await
            .map_err(|e| {
                let err = CheckpointError::from_store(partition_id, e);
                if err.is_terminal() {
                    warn!(
                        partition = %partition_id,
                        fencing_token = %fencing_token,
                        error = %err,
                        "Lost partition ownership while checkpointing"
                    );
                }
                err
            })?;

        debug!(
            partition = %partition_id,
            position = %position,
            fencing_token = %fencing_token,
            "Committed checkpoint"
        );

        Ok(())
    }

    /// Validate `position` and return a handle that commits it later.
    ///
    /// Performs the same checks as [`checkpoint`](Self::checkpoint) without
    /// writing. When `position` equals the committed position the returned
    /// handle is the no-op variant; the choice is made here, once.
    pub async fn prepare(
        self: &Arc<Self>,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<PreparedCheckpoint> {
        let current = self.validate(partition_id, position, fencing_token).await?;

        if current.map(|record| record.position) == Some(position) {
            debug!(
                partition = %partition_id,
                position = %position,
                "Prepared checkpoint equals committed position"
            );
            return Ok(PreparedCheckpoint::NoOp(NoOpPreparedCheckpoint::new(
                position,
            )));
        }

        debug!(
            partition = %partition_id,
            position = %position,
            "Prepared checkpoint"
        );

        Ok(PreparedCheckpoint::Store(StorePreparedCheckpoint::new(
            partition_id,
            position,
            fencing_token,
            Arc::downgrade(self),
        )))
    }

    /// Shared checks for `checkpoint` and `prepare`.
    ///
    /// Fencing is checked before ordering so a stale writer always learns it
    /// lost the partition, whatever position it offered.
    async fn validate(
        &self,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<Option<CheckpointRecord>> {
        if position.is_sentinel() {
            return Err(CheckpointError::InvalidPosition(format!(
                "sentinel position {} cannot be checkpointed",
                position
            )));
        }

        let current = self
            .store
            .read(partition_id)
            .await
            .map_err(|e| CheckpointError::from_store(partition_id, e))?;

        if let Some(record) = &current {
            if record.fencing_token > fencing_token {
                warn!(
                    partition = %partition_id,
                    offered = %fencing_token,
                    stored = %record.fencing_token,
                    "Checkpoint from stale fencing token"
                );
                return Err(CheckpointError::shutdown(
                    partition_id,
                    format!(
                        "fencing token {} superseded by {}",
                        fencing_token, record.fencing_token
                    ),
                ));
            }

            if position < record.position {
                warn!(
                    partition = %partition_id,
                    requested = %position,
                    committed = %record.position,
                    "Checkpoint moved backward"
                );
                return Err(CheckpointError::moved_backward(
                    partition_id,
                    position,
                    record.position,
                ));
            }
        }

        Ok(current)
    }
}
