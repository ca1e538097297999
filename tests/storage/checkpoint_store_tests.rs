//! CheckpointStore interface tests.
//!
//! These tests verify the contract of the CheckpointStore trait.
//! Each storage implementation should run these tests.

use stream_checkpoint::storage::{CheckpointStore, FencingToken, StoreError};
use stream_checkpoint::SequencePosition;

fn pos(primary: u128, secondary: u64) -> SequencePosition {
    SequencePosition::at(primary, secondary)
}

fn token(epoch: u64) -> FencingToken {
    FencingToken::new(epoch)
}

// =============================================================================
// CheckpointStore::read tests
// =============================================================================

pub async fn test_read_nonexistent<S: CheckpointStore>(store: &S) {
    let result = store
        .read("test_nonexistent")
        .await
        .expect("read should succeed");
    assert!(result.is_none(), "nonexistent partition should be None");
}

// =============================================================================
// CheckpointStore::conditional_write tests
// =============================================================================

pub async fn test_write_and_read<S: CheckpointStore>(store: &S) {
    let partition = "test_write_read";

    store
        .conditional_write(partition, pos(42, 0), token(1))
        .await
        .expect("write should succeed");

    let record = store
        .read(partition)
        .await
        .expect("read should succeed")
        .expect("record should exist");

    assert_eq!(record.position, pos(42, 0), "should return stored position");
    assert_eq!(record.fencing_token, token(1), "should return stored token");
}

pub async fn test_write_same_token_updates<S: CheckpointStore>(store: &S) {
    let partition = "test_write_update";

    store
        .conditional_write(partition, pos(10, 0), token(3))
        .await
        .unwrap();
    store
        .conditional_write(partition, pos(25, 0), token(3))
        .await
        .unwrap();

    let record = store.read(partition).await.unwrap().unwrap();
    assert_eq!(record.position, pos(25, 0), "should return updated position");
}

pub async fn test_newer_token_supersedes<S: CheckpointStore>(store: &S) {
    let partition = "test_newer_token";

    store
        .conditional_write(partition, pos(10, 0), token(1))
        .await
        .unwrap();
    store
        .conditional_write(partition, pos(11, 0), token(2))
        .await
        .unwrap();

    let record = store.read(partition).await.unwrap().unwrap();
    assert_eq!(record.position, pos(11, 0));
    assert_eq!(record.fencing_token, token(2), "token should be replaced");
}

pub async fn test_stale_token_rejected<S: CheckpointStore>(store: &S) {
    let partition = "test_stale_token";

    store
        .conditional_write(partition, pos(10, 0), token(5))
        .await
        .unwrap();

    let err = store
        .conditional_write(partition, pos(20, 0), token(4))
        .await
        .expect_err("stale writer should be rejected");

    match err {
        StoreError::FencingRejected {
            offered, stored, ..
        } => {
            assert_eq!(offered, token(4));
            assert_eq!(stored, token(5));
        }
        other => panic!("expected FencingRejected, got {:?}", other),
    }

    let record = store.read(partition).await.unwrap().unwrap();
    assert_eq!(record.position, pos(10, 0), "rejected write must not apply");
    assert_eq!(record.fencing_token, token(5));
}

pub async fn test_store_does_not_order_positions<S: CheckpointStore>(store: &S) {
    let partition = "test_unordered";

    // Ordering is the checkpointer's job; the store only fences
    store
        .conditional_write(partition, pos(50, 0), token(1))
        .await
        .unwrap();
    store
        .conditional_write(partition, pos(40, 0), token(1))
        .await
        .unwrap();

    let record = store.read(partition).await.unwrap().unwrap();
    assert_eq!(record.position, pos(40, 0));
}

pub async fn test_large_ordinals<S: CheckpointStore>(store: &S) {
    let partition = "test_large_ordinals";
    let position = pos(49_590_338_271_490_256_608_559_692_538_361_571_095, 17);

    store
        .conditional_write(partition, position, token(u32::MAX as u64))
        .await
        .unwrap();

    let record = store.read(partition).await.unwrap().unwrap();
    assert_eq!(record.position, position, "128-bit ordinals must survive");
    assert_eq!(record.fencing_token, token(u32::MAX as u64));
}

// =============================================================================
// Isolation tests
// =============================================================================

pub async fn test_partition_isolation<S: CheckpointStore>(store: &S) {
    store
        .conditional_write("test_iso_a", pos(100, 0), token(1))
        .await
        .unwrap();
    store
        .conditional_write("test_iso_b", pos(200, 0), token(7))
        .await
        .unwrap();

    let a = store.read("test_iso_a").await.unwrap().unwrap();
    let b = store.read("test_iso_b").await.unwrap().unwrap();

    assert_eq!(a.position, pos(100, 0), "partition a should be 100");
    assert_eq!(b.position, pos(200, 0), "partition b should be 200");

    // A high token on one partition does not fence another
    store
        .conditional_write("test_iso_a", pos(101, 0), token(1))
        .await
        .expect("tokens are per partition");
}

pub async fn test_racing_owners<S: CheckpointStore>(store: &S) {
    let partition = "test_racing_owners";

    store
        .conditional_write(partition, pos(1, 0), token(1))
        .await
        .unwrap();

    // Old and new owner race during handoff; the newer token must end up stored
    let (old, new) = tokio::join!(
        store.conditional_write(partition, pos(5, 0), token(1)),
        store.conditional_write(partition, pos(3, 0), token(2)),
    );
    new.expect("newest owner always wins");

    let record = store.read(partition).await.unwrap().unwrap();
    assert_eq!(record.fencing_token, token(2));
    assert_eq!(record.position, pos(3, 0));

    if let Err(err) = old {
        assert!(matches!(err, StoreError::FencingRejected { .. }));
    }
}

// =============================================================================
// Test runner macro
// =============================================================================

/// Run all CheckpointStore interface tests against a store implementation.
#[macro_export]
macro_rules! run_checkpoint_store_tests {
    ($store:expr) => {
        use $crate::storage::checkpoint_store_tests::*;

        // read tests
        test_read_nonexistent($store).await;
        println!("  test_read_nonexistent: PASSED");

        // write tests
        test_write_and_read($store).await;
        println!("  test_write_and_read: PASSED");

        test_write_same_token_updates($store).await;
        println!("  test_write_same_token_updates: PASSED");

        test_newer_token_supersedes($store).await;
        println!("  test_newer_token_supersedes: PASSED");

        test_stale_token_rejected($store).await;
        println!("  test_stale_token_rejected: PASSED");

        test_store_does_not_order_positions($store).await;
        println!("  test_store_does_not_order_positions: PASSED");

        test_large_ordinals($store).await;
        println!("  test_large_ordinals: PASSED");

        // isolation tests
        test_partition_isolation($store).await;
        println!("  test_partition_isolation: PASSED");

        test_racing_owners($store).await;
        println!("  test_racing_owners: PASSED");
    };
}
