//! Core type definitions for tabstate.
//!
//! This crate defines the small, backend-agnostic types shared by the
//! storage and sync layers:
//! - Context identifiers (UUID v7)
//! - Slot configuration and the key resolver that turns it into a slot name
//! - Change notifications broadcast after every persisted write
//! - Helpers for JSON state values (shallow merge, empty state)

mod config;
mod notification;
mod value;

pub use config::{resolve, SlotConfig, SlotName, StorageKind, DEFAULT_KEY};
pub use notification::{ChangeNotification, ContextId};
pub use value::{empty_state, shallow_merge, StateValue};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid storage kind: {0} (expected \"local\" or \"session\")")]
    InvalidStorageKind(String),
}
