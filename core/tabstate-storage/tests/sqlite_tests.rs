use tabstate_storage::{KeyValueStorage, SqliteStorage};

#[test]
fn in_memory_set_and_get() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    assert_eq!(storage.get_item("k").unwrap(), None);

    storage.set_item("k", r#"{"a":1}"#).unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some(r#"{"a":1}"#));
}

#[test]
fn upsert_replaces_value() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.set_item("k", "1").unwrap();
    storage.set_item("k", "2").unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("2"));
}

#[test]
fn values_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slots.db");

    {
        let storage = SqliteStorage::open(&path).unwrap();
        storage.set_item("globalStatelocal", r#"{"count":3}"#).unwrap();
    }

    let reopened = SqliteStorage::open(&path).unwrap();
    assert_eq!(
        reopened.get_item("globalStatelocal").unwrap().as_deref(),
        Some(r#"{"count":3}"#)
    );
}

#[test]
fn empty_string_is_stored_verbatim() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    storage.set_item("k", "").unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some(""));
}
