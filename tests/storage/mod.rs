//! Shared storage integration tests.
//!
//! Tests the CheckpointStore interface against all implementations.
//! Each implementation module imports these test functions and runs them.

pub mod checkpoint_store_tests;
