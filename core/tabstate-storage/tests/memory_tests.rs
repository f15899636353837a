use tabstate_storage::{KeyValueStorage, MemoryStorage, StorageError};

// ── Basic access ─────────────────────────────────────────────────

#[test]
fn missing_key_reads_none() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get_item("nope").unwrap(), None);
    assert!(storage.is_empty());
}

#[test]
fn set_then_get() {
    let storage = MemoryStorage::new();
    storage.set_item("k", r#"{"a":1}"#).unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some(r#"{"a":1}"#));
    assert_eq!(storage.len(), 1);
}

#[test]
fn set_replaces_previous_value() {
    let storage = MemoryStorage::new();
    storage.set_item("k", "1").unwrap();
    storage.set_item("k", "2").unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("2"));
    assert_eq!(storage.len(), 1);
}

#[test]
fn usage_counts_keys_and_values() {
    let storage = MemoryStorage::new();
    storage.set_item("ab", "cde").unwrap();
    storage.set_item("f", "").unwrap();
    assert_eq!(storage.usage(), 6);
}

// ── Quota ────────────────────────────────────────────────────────

#[test]
fn write_within_quota_succeeds() {
    let storage = MemoryStorage::with_quota(10);
    storage.set_item("key", "1234567").unwrap();
    assert_eq!(storage.usage(), 10);
}

#[test]
fn write_past_quota_fails_and_keeps_old_value() {
    let storage = MemoryStorage::with_quota(10);
    storage.set_item("key", "123").unwrap();

    let err = storage.set_item("key", "12345678").unwrap_err();
    match err {
        StorageError::QuotaExceeded {
            key,
            required,
            quota,
        } => {
            assert_eq!(key, "key");
            assert_eq!(required, 11);
            assert_eq!(quota, 10);
        }
        other => panic!("Expected QuotaExceeded, got {other:?}"),
    }
    assert_eq!(storage.get_item("key").unwrap().as_deref(), Some("123"));
}

#[test]
fn replacing_a_value_only_counts_the_difference() {
    let storage = MemoryStorage::with_quota(8);
    storage.set_item("k", "1234567").unwrap();
    // Same size replacement fits even though the total is at the quota.
    storage.set_item("k", "abcdefg").unwrap();
}

// ── Disabled ─────────────────────────────────────────────────────

#[test]
fn disabled_storage_rejects_access() {
    let storage = MemoryStorage::new();
    storage.set_item("k", "v").unwrap();
    storage.set_enabled(false);

    assert!(!storage.is_enabled());
    assert!(matches!(storage.get_item("k"), Err(StorageError::Disabled)));
    assert!(matches!(storage.set_item("k", "w"), Err(StorageError::Disabled)));

    storage.set_enabled(true);
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
}
