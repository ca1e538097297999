//! Redis CheckpointStore implementation.
//!
//! Each partition is a hash with `position` and `fencing_token` fields.
//! Writes run a Lua script so the fencing comparison and the update are a
//! single atomic step on the server.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, Script};
use tracing::{debug, info, warn};

use crate::checkpoint::SequencePosition;
use crate::storage::{CheckpointRecord, CheckpointStore, FencingToken, Result, StoreError};

/// Compare-and-set on the fencing token.
///
/// Tokens are compared as decimal strings (length first, then lexically) so
/// values beyond 2^53 compare exactly. Returns `{1, token}` on success or
/// `{0, stored_token}` when a newer writer owns the partition.
const CONDITIONAL_WRITE_SCRIPT: &str = r#"
local stored = redis.call('HGET', KEYS[1], 'fencing_token')
if stored then
    local offered = ARGV[2]
    if #stored > #offered or (#stored == #offered and stored > offered) then
        return {0, stored}
    end
end
redis.call('HSET', KEYS[1], 'position', ARGV[1], 'fencing_token', ARGV[2])
return {1, ARGV[2]}
"#;

/// Redis implementation of CheckpointStore.
///
/// Key format: `{prefix}:checkpoint:{partition_id}`
pub struct RedisCheckpointStore {
    conn: ConnectionManager,
    key_prefix: String,
    script: Script,
}

impl RedisCheckpointStore {
    /// Create a new Redis checkpoint store.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., redis://localhost:6379)
    /// * `key_prefix` - Prefix for all keys (default: "checkpoint")
    pub async fn new(url: &str, key_prefix: Option<&str>) -> Result<Self> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        info!(url = %url, "Connected to Redis for checkpoints");

        Ok(Self {
            conn,
            key_prefix: key_prefix.unwrap_or("checkpoint").to_string(),
            script: Script::new(CONDITIONAL_WRITE_SCRIPT),
        })
    }

    fn checkpoint_key(&self, partition_id: &str) -> String {
        format!("{}:checkpoint:{}", self.key_prefix, partition_id)
    }
}

fn parse_token(raw: &str) -> Result<FencingToken> {
    raw.parse::<u64>()
        .map(FencingToken::new)
        .map_err(|_| StoreError::Codec(format!("malformed fencing token '{}'", raw)))
}

#[async_trait]
impl CheckpointStore for RedisCheckpointStore {
    async fn read(&self, partition_id: &str) -> Result<Option<CheckpointRecord>> {
        let key = self.checkpoint_key(partition_id);
        let mut conn = self.conn.clone();

        let (position, token): (Option<String>, Option<String>) = redis::cmd("HMGET")
            .arg(&key)
            .arg("position")
            .arg("fencing_token")
            .query_async(&mut conn)
            .await?;

        match (position, token) {
            (None, None) => Ok(None),
            (Some(position), Some(token)) => {
                let position = position
                    .parse::<SequencePosition>()
                    .map_err(|e| StoreError::Codec(e.to_string()))?;
                Ok(Some(CheckpointRecord::new(position, parse_token(&token)?)))
            }
            _ => Err(StoreError::Codec(format!(
                "checkpoint hash {} is missing a field",
                key
            ))),
        }
    }

    async fn conditional_write(
        &self,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<()> {
        let key = self.checkpoint_key(partition_id);
        let mut conn = self.conn.clone();

        let (accepted, token): (i64, String) = self
            .script
            .key(&key)
            .arg(position.to_string())
            .arg(fencing_token.value().to_string())
            .invoke_async(&mut conn)
            .await?;

        if accepted == 0 {
            let stored = parse_token(&token)?;
            warn!(
                partition = %partition_id,
                offered = %fencing_token,
                stored = %stored,
                "Redis rejected checkpoint from stale writer"
            );
            return Err(StoreError::FencingRejected {
                partition: partition_id.to_string(),
                offered: fencing_token,
                stored,
            });
        }

        debug!(
            partition = %partition_id,
            position = %position,
            fencing_token = %fencing_token,
            "Stored checkpoint in Redis"
        );

        Ok(())
    }
}
