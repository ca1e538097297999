//! File storage contract tests.
//!
//! Run with: cargo test --test storage_file

mod storage;

use stream_checkpoint::storage::FileCheckpointStore;
use tempfile::TempDir;

#[tokio::test]
async fn test_file_checkpoint_store() {
    println!("=== File CheckpointStore Tests ===");

    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("checkpoints.json");
    println!("Using file: {}", path.display());

    let store = FileCheckpointStore::new(&path);
    run_checkpoint_store_tests!(&store);

    println!("=== All File CheckpointStore tests PASSED ===");
}
