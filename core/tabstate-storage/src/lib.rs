//! Storage capabilities and change broadcast for tabstate.
//!
//! The sync engine needs two collaborators from its host:
//! - a synchronous string key/value store per storage kind
//!   ([`KeyValueStorage`]), and
//! - a publish/subscribe channel visible to every context of the origin
//!   ([`ChangeBus`]).
//!
//! # Architecture
//!
//! - [`MemoryStorage`] keeps slots in memory, with an optional byte quota and
//!   a switch to simulate storage that has been disabled
//! - [`SqliteStorage`] persists slots in a SQLite file, suited to `local`
//! - [`StorageOrigin`] bundles one storage per kind with the shared bus, the
//!   way a browser origin bundles its storage areas and `storage` events

mod bus;
mod error;
mod kv;
mod memory;
mod origin;
mod sqlite;

pub use bus::{ChangeBus, DEFAULT_BUS_CAPACITY};
pub use error::{StorageError, StorageResult};
pub use kv::KeyValueStorage;
pub use memory::MemoryStorage;
pub use origin::StorageOrigin;
pub use sqlite::SqliteStorage;
