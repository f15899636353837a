//! The key/value storage capability.

use crate::StorageResult;

/// A synchronous string key/value store.
///
/// Mirrors the capability a browser exposes through `localStorage` and
/// `sessionStorage`: reads and writes complete (or fail) before returning.
pub trait KeyValueStorage: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
}
