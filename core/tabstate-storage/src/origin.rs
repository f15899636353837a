//! A storage origin: the storage areas and the bus its contexts share.

use crate::{ChangeBus, KeyValueStorage, MemoryStorage};
use std::fmt;
use std::sync::Arc;
use tabstate_types::StorageKind;

/// Everything contexts of one origin share: a `local` storage, a `session`
/// storage and the change bus. Cloning yields another handle to the same
/// origin.
#[derive(Clone)]
pub struct StorageOrigin {
    local: Arc<dyn KeyValueStorage>,
    session: Arc<dyn KeyValueStorage>,
    bus: ChangeBus,
}

impl StorageOrigin {
    /// Creates an origin from explicit collaborators.
    pub fn new(
        local: Arc<dyn KeyValueStorage>,
        session: Arc<dyn KeyValueStorage>,
        bus: ChangeBus,
    ) -> Self {
        Self {
            local,
            session,
            bus,
        }
    }

    /// Creates an origin with unbounded in-memory storage for both kinds.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
            ChangeBus::new(),
        )
    }

    /// Returns the storage for a kind.
    pub fn storage(&self, kind: StorageKind) -> Arc<dyn KeyValueStorage> {
        match kind {
            StorageKind::Local => Arc::clone(&self.local),
            StorageKind::Session => Arc::clone(&self.session),
        }
    }

    /// Returns the shared change bus.
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }
}

impl fmt::Debug for StorageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageOrigin")
            .field("subscribers", &self.bus.receiver_count())
            .finish_non_exhaustive()
    }
}
