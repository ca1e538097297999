//! SQLite storage contract tests.
//!
//! Run with: cargo test --test storage_sqlite --features sqlite
//!
//! Uses a temporary database file, no external dependencies required.

mod storage;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use stream_checkpoint::storage::{CheckpointStore, FencingToken, SqliteCheckpointStore};
use stream_checkpoint::SequencePosition;
use tempfile::TempDir;

async fn connect_and_init(dir: &TempDir) -> SqliteCheckpointStore {
    let options = SqliteConnectOptions::new()
        .filename(dir.path().join("checkpoints.db"))
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .expect("Failed to connect to SQLite");

    let store = SqliteCheckpointStore::new(pool);
    store.init().await.expect("Failed to create checkpoints table");
    store
}

#[tokio::test]
async fn test_sqlite_checkpoint_store() {
    println!("=== SQLite CheckpointStore Tests ===");

    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = connect_and_init(&dir).await;

    run_checkpoint_store_tests!(&store);

    println!("=== All SQLite CheckpointStore tests PASSED ===");
}

#[tokio::test]
async fn test_sqlite_init_is_idempotent() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = connect_and_init(&dir).await;

    store
        .conditional_write("shard-0", SequencePosition::at(9, 0), FencingToken::new(1))
        .await
        .unwrap();
    store.init().await.expect("second init should succeed");

    let record = store.read("shard-0").await.unwrap().unwrap();
    assert_eq!(record.position, SequencePosition::at(9, 0));
}

#[tokio::test]
async fn test_sqlite_rejects_token_beyond_integer_range() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = connect_and_init(&dir).await;

    let err = store
        .conditional_write(
            "shard-0",
            SequencePosition::at(1, 0),
            FencingToken::new(u64::MAX),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        stream_checkpoint::storage::StoreError::Codec(_)
    ));
}
