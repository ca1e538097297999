//! stream-checkpoint - Two-phase checkpointing for stream workers
//!
//! Records, per partition of an ordered record stream, how far a worker has
//! progressed so another worker can resume there after failure or rebalance.
//!
//! - [`checkpoint`]: positions, the checkpointer, prepared checkpoints
//! - [`storage`]: the `CheckpointStore` contract and its backends
//! - [`config`]: YAML/environment configuration
//! - [`utils`]: tracing bootstrap and opt-in retry helpers

pub mod checkpoint;
pub mod config;
pub mod storage;
pub mod utils;

pub use checkpoint::{
    CheckpointError, Checkpointer, ErrorKind, PartitionCheckpointer, PreparedCheckpoint,
    PreparedCheckpointer, SequencePosition,
};
pub use storage::{CheckpointRecord, CheckpointStore, FencingToken};
