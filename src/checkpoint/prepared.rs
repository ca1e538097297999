//! Prepared (not yet durable) checkpoints.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tracing::debug;

use super::partition::LastCommitted;
use super::{CheckpointError, Checkpointer, Result, SequencePosition};
use crate::storage::FencingToken;

/// Capability shared by every prepared checkpoint.
#[async_trait]
pub trait PreparedCheckpointer: Send + Sync {
    /// The position this checkpoint will commit.
    fn pending_checkpoint(&self) -> SequencePosition;

    /// Durably commit the pending position.
    ///
    /// Safe to call more than once: after a success, later calls return
    /// `Ok(())` without I/O; after a transient failure, a later call retries
    /// the write.
    async fn commit(&self) -> Result<()>;
}

/// A prepared checkpoint, selected once at prepare time.
#[derive(Debug)]
pub enum PreparedCheckpoint {
    /// Commit writes through the checkpointer.
    Store(StorePreparedCheckpoint),
    /// Pending position already equals the committed position.
    NoOp(NoOpPreparedCheckpoint),
}

impl PreparedCheckpoint {
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::NoOp(_))
    }
}

#[async_trait]
impl PreparedCheckpointer for PreparedCheckpoint {
    fn pending_checkpoint(&self) -> SequencePosition {
        match self {
            Self::Store(prepared) => prepared.pending_checkpoint(),
            Self::NoOp(prepared) => prepared.pending_checkpoint(),
        }
    }

    async fn commit(&self) -> Result<()> {
        match self {
            Self::Store(prepared) => prepared.commit().await,
            Self::NoOp(prepared) => prepared.commit().await,
        }
    }
}

/// Prepared checkpoint that commits through a [`Checkpointer`].
#[derive(Debug)]
pub struct StorePreparedCheckpoint {
    partition_id: String,
    pending: SequencePosition,
    fencing_token: FencingToken,
    checkpointer: Weak<Checkpointer>,
    committed: AtomicBool,
    last_committed: Option<Arc<LastCommitted>>,
}

impl StorePreparedCheckpoint {
    pub(crate) fn new(
        partition_id: &str,
        pending: SequencePosition,
        fencing_token: FencingToken,
        checkpointer: Weak<Checkpointer>,
    ) -> Self {
        Self {
            partition_id: partition_id.to_string(),
            pending,
            fencing_token,
            checkpointer,
            committed: AtomicBool::new(false),
            last_committed: None,
        }
    }

    /// Report a successful commit to the handle that prepared this checkpoint.
    pub(crate) fn recording_to(mut self, last_committed: Arc<LastCommitted>) -> Self {
        self.last_committed = Some(last_committed);
        self
    }

    pub fn partition_id(&self) -> &str {
        &self.partition_id
    }

    pub fn fencing_token(&self) -> FencingToken {
        self.fencing_token
    }
}

#[async_trait]
impl PreparedCheckpointer for StorePreparedCheckpoint {
    fn pending_checkpoint(&self) -> SequencePosition {
        self.pending
    }

    async fn commit(&self) -> Result<()> {
        if self.committed.load(Ordering::Acquire) {
            return Ok(());
        }

        // Worker that prepared this checkpoint is gone
        let checkpointer = self.checkpointer.upgrade().ok_or_else(|| {
            CheckpointError::shutdown(&self.partition_id, "checkpointer has been dropped")
        })?;

        checkpointer
            .checkpoint(&self.partition_id, self.pending, self.fencing_token)
            .await?;

        self.committed.store(true, Ordering::Release);
        if let Some(last_committed) = &self.last_committed {
            last_committed.record(self.pending);
        }
        Ok(())
    }
}

/// Prepared checkpoint whose commit does nothing.
///
/// Only constructed when the pending position equals the committed one, so
/// no write could change durable state.
///
/// # Precondition
///
/// Prepared equals committed only when the worker processed zero records
/// since the last commit (e.g. it was initialized, received nothing, then
/// prepared). The worker enforces this; the checkpointer cannot verify it.
/// Preparing a stale position after processing records silently drops that
/// progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoOpPreparedCheckpoint {
    pending: SequencePosition,
}

impl NoOpPreparedCheckpoint {
    pub fn new(pending: SequencePosition) -> Self {
        Self { pending }
    }
}

#[async_trait]
impl PreparedCheckpointer for NoOpPreparedCheckpoint {
    fn pending_checkpoint(&self) -> SequencePosition {
        self.pending
    }

    async fn commit(&self) -> Result<()> {
        debug!(position = %self.pending, "No-op checkpoint commit");
        Ok(())
    }
}
