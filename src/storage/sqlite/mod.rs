//! SQLite implementation of the checkpoint store.

mod checkpoint_store;

pub use checkpoint_store::SqliteCheckpointStore;

use crate::storage::StoreError;

/// Primary result codes that mean "try again later".
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) => {
                let contended = db
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    // Extended result codes carry the primary code in the low byte
                    .map(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
                    .unwrap_or(false);
                if contended {
                    StoreError::Throttled(e.to_string())
                } else {
                    StoreError::DependencyUnavailable(e.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => StoreError::Throttled(e.to_string()),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_) => StoreError::Codec(e.to_string()),
            _ => StoreError::DependencyUnavailable(e.to_string()),
        }
    }
}
