//! Retry utilities: retryable error classification and commit retries.
//!
//! The checkpoint core returns typed errors and never retries. Workers that
//! want retry-with-backoff opt in here, passing the policy built from
//! [`RetryConfig::backoff`](crate::config::RetryConfig::backoff).

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::checkpoint::{CheckpointError, PreparedCheckpointer};

/// Determines if a checkpoint error is worth retrying.
///
/// Retryable kinds:
/// - `Throttling`: backend rate-limited the call
/// - `Dependency`: backend unreachable
///
/// Non-retryable:
/// - `InvalidPosition` / `InvalidState`: caller bugs; retrying repeats them
/// - `Shutdown`: partition lost; stop processing it
pub fn is_retryable(error: &CheckpointError) -> bool {
    error.is_retryable()
}

/// Commit a prepared checkpoint, retrying transient failures with `backoff`.
///
/// `backoff` is normally `config.retry.backoff()`.
///
/// Returns the last error once retries are exhausted, or immediately for
/// non-retryable errors.
pub async fn commit_with_retry<P>(
    prepared: &P,
    backoff: ExponentialBuilder,
) -> Result<(), CheckpointError>
where
    P: PreparedCheckpointer + ?Sized,
{
    (|| prepared.commit())
        .retry(backoff)
        .when(is_retryable)
        .notify(|err: &CheckpointError, delay: Duration| {
            warn!(
                position = %prepared.pending_checkpoint(),
                error = %err,
                delay_ms = delay.as_millis() as u64,
                "Checkpoint commit failed, retrying"
            );
        })
        .await
}
