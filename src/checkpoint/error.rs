//! Checkpoint error taxonomy.

use crate::storage::StoreError;

/// Result type for checkpoint operations.
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors returned by checkpoint operations.
///
/// Each variant calls for a different response from the worker, so callers
/// should branch on [`CheckpointError::kind`] rather than on the message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckpointError {
    /// Sentinel or negative-ordinal position. Fix the caller; not retryable.
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    /// Requested position precedes the committed one, or stored state is unreadable.
    #[error("Invalid state for partition {partition}: {message}")]
    InvalidState { partition: String, message: String },

    /// Backend rate-limited the request. Retry with backoff.
    #[error("Throttled while checkpointing partition {partition}: {message}")]
    Throttling { partition: String, message: String },

    /// Backend unreachable. Retry with backoff.
    #[error("Dependency unavailable while checkpointing partition {partition}: {message}")]
    Dependency { partition: String, message: String },

    /// Fencing token rejected: this worker no longer owns the partition.
    #[error("Partition {partition} is no longer owned by this worker: {message}")]
    Shutdown { partition: String, message: String },
}

/// Discriminant of [`CheckpointError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPosition,
    InvalidState,
    Throttling,
    Dependency,
    Shutdown,
}

impl CheckpointError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPosition(_) => ErrorKind::InvalidPosition,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Throttling { .. } => ErrorKind::Throttling,
            Self::Dependency { .. } => ErrorKind::Dependency,
            Self::Shutdown { .. } => ErrorKind::Shutdown,
        }
    }

    /// Transient backend faults that leave progress state untouched.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Throttling | ErrorKind::Dependency)
    }

    /// Stop processing the partition and release its resources.
    pub fn is_terminal(&self) -> bool {
        self.kind() == ErrorKind::Shutdown
    }

    pub(crate) fn moved_backward(
        partition: &str,
        requested: impl std::fmt::Display,
        committed: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidState {
            partition: partition.to_string(),
            message: format!(
                "checkpoint moved backward: requested {}, committed {}",
                requested, committed
            ),
        }
    }

    pub(crate) fn shutdown(partition: &str, message: impl Into<String>) -> Self {
        Self::Shutdown {
            partition: partition.to_string(),
            message: message.into(),
        }
    }

    /// Translate a backend fault for `partition` into the checkpoint taxonomy.
    pub fn from_store(partition: &str, error: StoreError) -> Self {
        let partition = partition.to_string();
        match error {
            StoreError::Throttled(message) => Self::Throttling { partition, message },
            StoreError::DependencyUnavailable(message) => Self::Dependency { partition, message },
            e @ StoreError::FencingRejected { .. } => Self::Shutdown {
                partition,
                message: e.to_string(),
            },
            StoreError::Codec(message) => Self::InvalidState {
                partition,
                message: format!("stored checkpoint is unreadable: {}", message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FencingToken;

    #[test]
    fn test_store_error_mapping() {
        let throttled = CheckpointError::from_store("p-1", StoreError::Throttled("slow".into()));
        assert_eq!(throttled.kind(), ErrorKind::Throttling);
        assert!(throttled.is_retryable());

        let down = CheckpointError::from_store(
            "p-1",
            StoreError::DependencyUnavailable("connection refused".into()),
        );
        assert_eq!(down.kind(), ErrorKind::Dependency);
        assert!(down.is_retryable());

        let fenced = CheckpointError::from_store(
            "p-1",
            StoreError::FencingRejected {
                partition: "p-1".into(),
                offered: FencingToken::new(1),
                stored: FencingToken::new(2),
            },
        );
        assert_eq!(fenced.kind(), ErrorKind::Shutdown);
        assert!(fenced.is_terminal());
        assert!(!fenced.is_retryable());

        let corrupt = CheckpointError::from_store("p-1", StoreError::Codec("bad".into()));
        assert_eq!(corrupt.kind(), ErrorKind::InvalidState);
        assert!(!corrupt.is_retryable());
    }

    #[test]
    fn test_moved_backward_message() {
        let err = CheckpointError::moved_backward("shard-7", "102", "105");
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(err.to_string().contains("moved backward"));
        assert!(err.to_string().contains("shard-7"));
    }
}
