//! In-memory CheckpointStore implementation.
//!
//! Used for local development and as the reference store in tests. Supports
//! fault injection and counts every call that reaches the store, so tests can
//! assert exactly how much I/O a checkpoint operation issued.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{CheckpointRecord, CheckpointStore, FencingToken, Result, StoreError};
use crate::checkpoint::SequencePosition;

/// Backend fault to inject into the next calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Throttled,
    Unavailable,
}

impl Fault {
    fn into_error(self) -> StoreError {
        match self {
            Fault::Throttled => StoreError::Throttled("injected throttling".to_string()),
            Fault::Unavailable => {
                StoreError::DependencyUnavailable("injected outage".to_string())
            }
        }
    }
}

/// Remaining injected failures for one operation.
#[derive(Debug, Default)]
struct PendingFaults {
    fault: Option<Fault>,
    remaining: usize,
}

impl PendingFaults {
    fn take(&mut self) -> Option<Fault> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.fault
    }
}

/// Checkpoint store that keeps records in memory.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    records: RwLock<HashMap<String, CheckpointRecord>>,
    read_faults: Mutex<PendingFaults>,
    write_faults: Mutex<PendingFaults>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` reads with `fault`.
    pub async fn inject_read_faults(&self, fault: Fault, times: usize) {
        *self.read_faults.lock().await = PendingFaults {
            fault: Some(fault),
            remaining: times,
        };
    }

    /// Fail the next `times` conditional writes with `fault`.
    pub async fn inject_write_faults(&self, fault: Fault, times: usize) {
        *self.write_faults.lock().await = PendingFaults {
            fault: Some(fault),
            remaining: times,
        };
    }

    /// Number of `read` calls, including failed ones.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `conditional_write` calls, including rejected ones.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        self.reads.store(0, Ordering::SeqCst);
        self.writes.store(0, Ordering::SeqCst);
    }

    /// Snapshot of a partition's record without touching the counters.
    pub async fn get_stored(&self, partition_id: &str) -> Option<CheckpointRecord> {
        self.records.read().await.get(partition_id).copied()
    }

    pub async fn stored_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn read(&self, partition_id: &str) -> Result<Option<CheckpointRecord>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.read_faults.lock().await.take() {
            return Err(fault.into_error());
        }
        Ok(self.records.read().await.get(partition_id).copied())
    }

    async fn conditional_write(
        &self,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if let Some(fault) = self.write_faults.lock().await.take() {
            return Err(fault.into_error());
        }

        let mut records = self.records.write().await;
        if let Some(existing) = records.get(partition_id) {
            if existing.fencing_token > fencing_token {
                return Err(StoreError::FencingRejected {
                    partition: partition_id.to_string(),
                    offered: fencing_token,
                    stored: existing.fencing_token,
                });
            }
        }

        records.insert(
            partition_id.to_string(),
            CheckpointRecord::new(position, fencing_token),
        );

        debug!(
            partition = %partition_id,
            position = %position,
            fencing_token = %fencing_token,
            "Stored checkpoint in memory"
        );

        Ok(())
    }
}
