//! Worker-facing checkpoint handle for one partition.

use std::sync::{Arc, RwLock};

use super::{CheckpointError, Checkpointer, PreparedCheckpoint, Result, SequencePosition};
use crate::storage::FencingToken;

/// Last position a handle committed, shared with the prepared checkpoints it
/// hands out so a later `commit()` is recorded on the handle.
#[derive(Debug, Default)]
pub(crate) struct LastCommitted(RwLock<Option<SequencePosition>>);

impl LastCommitted {
    pub(crate) fn get(&self) -> Option<SequencePosition> {
        *self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Commits are monotonic per partition; keep the highest one seen.
    pub(crate) fn record(&self, position: SequencePosition) {
        let mut last = self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.map_or(true, |current| position > current) {
            *last = Some(position);
        }
    }
}

/// Checkpoint handle bound to one partition and the fencing token its worker holds.
///
/// Handed to the record-processing loop for the lifetime of its lease. It
/// remembers the highest position delivered to the worker and refuses to
/// checkpoint past it: records that were never delivered cannot be done.
///
/// The handle owns no committed state. `last_checkpoint_value` is local
/// bookkeeping and never decides whether a write happens. It tracks commits
/// made directly and through checkpoints prepared by this handle.
pub struct PartitionCheckpointer {
    checkpointer: Arc<Checkpointer>,
    partition_id: String,
    fencing_token: FencingToken,
    largest_permitted: Option<SequencePosition>,
    last_checkpoint: Arc<LastCommitted>,
}

impl PartitionCheckpointer {
    pub fn new(
        checkpointer: Arc<Checkpointer>,
        partition_id: impl Into<String>,
        fencing_token: FencingToken,
    ) -> Self {
        Self {
            checkpointer,
            partition_id: partition_id.into(),
            fencing_token,
            largest_permitted: None,
            last_checkpoint: Arc::default(),
        }
    }

    pub fn partition_id(&self) -> &str {
        &self.partition_id
    }

    pub fn fencing_token(&self) -> FencingToken {
        self.fencing_token
    }

    pub fn largest_permitted(&self) -> Option<SequencePosition> {
        self.largest_permitted
    }

    /// Last position committed through this handle, either directly or by a
    /// checkpoint it prepared.
    pub fn last_checkpoint_value(&self) -> Option<SequencePosition> {
        self.last_checkpoint.get()
    }

    /// Record the highest position delivered to the worker. Never moves backward.
    pub fn update_largest_permitted(&mut self, position: SequencePosition) -> Result<()> {
        if position.is_sentinel() {
            return Err(CheckpointError::InvalidPosition(format!(
                "sentinel position {} cannot bound checkpoints",
                position
            )));
        }
        if self.largest_permitted.map_or(true, |current| position > current) {
            self.largest_permitted = Some(position);
        }
        Ok(())
    }

    /// Commit at the highest delivered position.
    pub async fn checkpoint(&mut self) -> Result<()> {
        let position = self.require_largest_permitted()?;
        self.checkpoint_at(position).await
    }

    /// Commit at `position`, which must not exceed the highest delivered position.
    pub async fn checkpoint_at(&mut self, position: SequencePosition) -> Result<()> {
        self.ensure_permitted(position)?;
        self.checkpointer
            .checkpoint(&self.partition_id, position, self.fencing_token)
            .await?;
        self.last_checkpoint.record(position);
        Ok(())
    }

    /// Prepare a checkpoint at the highest delivered position.
    pub async fn prepare(&self) -> Result<PreparedCheckpoint> {
        let position = self.require_largest_permitted()?;
        self.prepare_at(position).await
    }

    /// Prepare a checkpoint at `position`.
    ///
    /// A successful `commit()` of the result updates
    /// [`last_checkpoint_value`](Self::last_checkpoint_value).
    pub async fn prepare_at(&self, position: SequencePosition) -> Result<PreparedCheckpoint> {
        self.ensure_permitted(position)?;
        let prepared = self
            .checkpointer
            .prepare(&self.partition_id, position, self.fencing_token)
            .await?;

        Ok(match prepared {
            PreparedCheckpoint::Store(prepared) => {
                PreparedCheckpoint::Store(prepared.recording_to(self.last_checkpoint.clone()))
            }
            no_op @ PreparedCheckpoint::NoOp(_) => no_op,
        })
    }

    fn require_largest_permitted(&self) -> Result<SequencePosition> {
        self.largest_permitted.ok_or_else(|| {
            CheckpointError::InvalidPosition(format!(
                "no records delivered for partition {} yet",
                self.partition_id
            ))
        })
    }

    fn ensure_permitted(&self, position: SequencePosition) -> Result<()> {
        match self.largest_permitted {
            Some(max) if !position.is_sentinel() && position > max => {
                Err(CheckpointError::InvalidPosition(format!(
                    "position {} is beyond the last delivered record {}",
                    position, max
                )))
            }
            _ => Ok(()),
        }
    }
}
