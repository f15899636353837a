//! In-memory key/value storage.

use crate::{KeyValueStorage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Key/value storage held in memory.
///
/// Usage is measured as the byte length of every key plus its value. With a
/// quota set, a write that would push usage past it fails with
/// [`StorageError::QuotaExceeded`] and leaves the previous value in place.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    disabled: AtomicBool,
}

impl MemoryStorage {
    /// Creates an empty, unbounded storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty storage limited to `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Enables or disables the storage. While disabled every access fails
    /// with [`StorageError::Disabled`].
    pub fn set_enabled(&self, enabled: bool) {
        self.disabled.store(!enabled, Ordering::SeqCst);
    }

    /// Whether the storage currently accepts reads and writes.
    pub fn is_enabled(&self) -> bool {
        !self.disabled.load(Ordering::SeqCst)
    }

    /// Bytes currently used by keys and values.
    pub fn usage(&self) -> usize {
        self.lock()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_enabled(&self) -> StorageResult<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(StorageError::Disabled)
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.check_enabled()?;
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_enabled()?;
        let mut items = self.lock();

        if let Some(quota) = self.quota {
            let current: usize = items.iter().map(|(k, v)| k.len() + v.len()).sum();
            let replaced = items.get(key).map_or(0, |old| key.len() + old.len());
            let required = current - replaced + key.len() + value.len();
            if required > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    quota,
                });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
