//! Caller-side retry configuration.

use std::time::Duration;

use backon::ExponentialBuilder;
use serde::Deserialize;

/// Backoff used by callers that retry transient checkpoint failures.
///
/// The checkpoint core never retries on its own; this only shapes
/// [`commit_with_retry`](crate::utils::retry::commit_with_retry).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    pub min_delay_ms: u64,
    /// Delay cap, in milliseconds.
    pub max_delay_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_times: usize,
    /// Randomize delays to avoid synchronized retries across workers.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 100,
            max_delay_ms: 10_000,
            max_times: 10,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_max_times(self.max_times);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}
