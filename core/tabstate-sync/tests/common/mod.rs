//! Shared test helpers for sync tests.

#![allow(dead_code)]

use serde_json::Value;
use std::time::Duration;
use tabstate_storage::{KeyValueStorage, StorageOrigin};
use tabstate_types::{SlotName, StorageKind};
use tracing_subscriber::EnvFilter;

/// Installs a test log subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Polls `check` until it holds, failing the test after two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within 2s"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}

/// Gives spawned tasks a chance to drain what is queued.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Reads and parses the value stored in a slot.
pub fn stored(origin: &StorageOrigin, kind: StorageKind, slot: &SlotName) -> Option<Value> {
    origin
        .storage(kind)
        .get_item(slot.as_str())
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}
