//! Error types for the sync layer.

use tabstate_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A value could not be converted to JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage rejected a read or write.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A persisted or broadcast value is not valid JSON.
    #[error("parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// The updater table is malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No action is bound under this name.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// A cursor's path no longer leads to a container.
    #[error("path `{path}` no longer resolves to an object or array")]
    DetachedPath { path: String },

    /// A path segment does not fit the container it addresses.
    #[error("cannot address {container} with {segment}")]
    InvalidSegment {
        container: &'static str,
        segment: String,
    },

    /// An array index past the end.
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Called outside a tokio runtime.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// The writer task is gone.
    #[error("channel closed")]
    ChannelClosed,
}

impl From<tabstate_types::Error> for SyncError {
    fn from(err: tabstate_types::Error) -> Self {
        match err {
            tabstate_types::Error::Serialization(e) => Self::Parse(e),
            other => Self::Configuration(other.to_string()),
        }
    }
}
