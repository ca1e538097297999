//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Checkpoints table schema.
#[derive(Iden)]
pub enum Checkpoints {
    Table,
    #[iden = "partition_id"]
    PartitionId,
    #[iden = "position"]
    Position,
    #[iden = "fencing_token"]
    FencingToken,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// SQL for creating the checkpoints table.
///
/// `position` holds the text form of a `SequencePosition`; primary ordinals
/// can exceed the range of an SQLite INTEGER.
pub const CREATE_CHECKPOINTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS checkpoints (
    partition_id TEXT NOT NULL PRIMARY KEY,
    position TEXT NOT NULL,
    fencing_token INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
