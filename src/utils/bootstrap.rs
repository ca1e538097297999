//! Bootstrap utilities for processes embedding the checkpoint core.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::checkpoint::Checkpointer;
use crate::config::{Config, LOG_ENV_VAR};
use crate::storage::init_store;

/// Initialize tracing with CHECKPOINT_LOG environment variable.
///
/// Defaults to "info" level if CHECKPOINT_LOG is not set.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build a checkpointer over the store selected by `config`.
///
/// Callers that retry commits pair it with `config.retry.backoff()` and
/// [`commit_with_retry`](crate::utils::retry::commit_with_retry).
pub async fn init_checkpointer(
    config: &Config,
) -> Result<Arc<Checkpointer>, Box<dyn std::error::Error + Send + Sync>> {
    let store = init_store(&config.storage).await.map_err(|e| {
        error!("Failed to initialize checkpoint store: {}", e);
        e
    })?;

    info!(storage_type = ?config.storage.storage_type, "Checkpointer ready");

    Ok(Arc::new(Checkpointer::new(store)))
}
