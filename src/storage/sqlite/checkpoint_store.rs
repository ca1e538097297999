//! SQLite CheckpointStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use crate::checkpoint::SequencePosition;
use crate::storage::schema::{Checkpoints, CREATE_CHECKPOINTS_TABLE};
use crate::storage::{CheckpointRecord, CheckpointStore, FencingToken, Result, StoreError};

/// SQLite implementation of CheckpointStore.
///
/// The conditional write is a single upsert whose update branch only fires
/// while the stored fencing token is not newer than the offered one, so the
/// check and the write are atomic.
pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    /// Create a new SQLite checkpoint store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the checkpoints table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::query(CREATE_CHECKPOINTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn encode_token(token: FencingToken) -> Result<i64> {
    i64::try_from(token.value()).map_err(|_| {
        StoreError::Codec(format!(
            "fencing token {} exceeds SQLite INTEGER range",
            token
        ))
    })
}

fn decode_token(raw: i64) -> Result<FencingToken> {
    u64::try_from(raw)
        .map(FencingToken::new)
        .map_err(|_| StoreError::Codec(format!("negative fencing token {} in store", raw)))
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn read(&self, partition_id: &str) -> Result<Option<CheckpointRecord>> {
        let query = Query::select()
            .columns([Checkpoints::Position, Checkpoints::FencingToken])
            .from(Checkpoints::Table)
            .and_where(Expr::col(Checkpoints::PartitionId).eq(partition_id))
            .to_string(SqliteQueryBuilder);

        let row = sqlx::query(&query).fetch_optional(&self.pool).await?;

        match row {
            Some(row) => {
                let position: String = row.try_get("position")?;
                let token: i64 = row.try_get("fencing_token")?;
                let position = position
                    .parse::<SequencePosition>()
                    .map_err(|e| StoreError::Codec(e.to_string()))?;
                Ok(Some(CheckpointRecord::new(position, decode_token(token)?)))
            }
            None => Ok(None),
        }
    }

    async fn conditional_write(
        &self,
        partition_id: &str,
        position: SequencePosition,
        fencing_token: FencingToken,
    ) -> Result<()> {
        let token = encode_token(fencing_token)?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        let query = Query::insert()
            .into_table(Checkpoints::Table)
            .columns([
                Checkpoints::PartitionId,
                Checkpoints::Position,
                Checkpoints::FencingToken,
                Checkpoints::UpdatedAt,
            ])
            .values_panic([
                partition_id.into(),
                position.to_string().into(),
                token.into(),
                updated_at.into(),
            ])
            .on_conflict(
                OnConflict::column(Checkpoints::PartitionId)
                    .update_columns([
                        Checkpoints::Position,
                        Checkpoints::FencingToken,
                        Checkpoints::UpdatedAt,
                    ])
                    .action_and_where(
                        Expr::col((Checkpoints::Table, Checkpoints::FencingToken)).lte(token),
                    )
                    .to_owned(),
            )
            .to_string(SqliteQueryBuilder);

        let result = sqlx::query(&query).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            let stored = self
                .read(partition_id)
                .await?
                .map(|record| record.fencing_token)
                .unwrap_or_default();
            warn!(
                partition = %partition_id,
                offered = %fencing_token,
                stored = %stored,
                "SQLite rejected checkpoint from stale writer"
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
            "Stored checkpoint in SQLite"
        );

        Ok(())
    }
}
