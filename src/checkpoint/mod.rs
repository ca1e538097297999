//! Two-phase checkpointing.
//!
//! Workers either commit a position directly through [`Checkpointer::checkpoint`]
//! or split the commit in two:
//!
//! 1. [`Checkpointer::prepare`] validates the position against the committed
//!    one and returns a [`PreparedCheckpoint`] without writing.
//! 2. The worker finishes its side effects, then calls
//!    [`PreparedCheckpointer::commit`].
//!
//! Committed positions never move backward. A commit at the already-committed
//! position succeeds without touching the store. Backend faults surface as
//! typed [`CheckpointError`]s; nothing here retries.

mod checkpointer;
mod error;
mod partition;
mod position;
mod prepared;

pub use checkpointer::Checkpointer;
pub use error::{CheckpointError, ErrorKind, Result};
pub use partition::PartitionCheckpointer;
pub use position::SequencePosition;
pub use prepared::{
    NoOpPreparedCheckpoint, PreparedCheckpoint, PreparedCheckpointer, StorePreparedCheckpoint,
};
