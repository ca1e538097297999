//! Redis implementation of the checkpoint store.

mod checkpoint_store;

pub use checkpoint_store::RedisCheckpointStore;

use redis::{ErrorKind, RedisError};

use crate::storage::StoreError;

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        match e.kind() {
            ErrorKind::BusyLoadingError | ErrorKind::TryAgain => {
                StoreError::Throttled(e.to_string())
            }
            ErrorKind::TypeError => StoreError::Codec(e.to_string()),
            _ => StoreError::DependencyUnavailable(e.to_string()),
        }
    }
}
