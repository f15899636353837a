//! Change notifications announced after every persisted write.

use crate::{empty_state, SlotName, StateValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Tags the context (engine instance) that performed a write. UUID v7, so
/// ids sort by creation time in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(Uuid);

impl ContextId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A `(key, new value)` pair broadcast to every context of a storage origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    /// Slot that was written.
    pub key: String,
    /// Serialized value now stored in the slot.
    pub new_value: Option<String>,
    /// Context that performed the write, when known. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ContextId>,
}

impl ChangeNotification {
    /// Creates a notification without a source context.
    pub fn new(key: impl Into<String>, new_value: Option<String>) -> Self {
        Self {
            key: key.into(),
            new_value,
            source: None,
        }
    }

    /// Tags the notification with the context that wrote it.
    #[must_use]
    pub fn with_source(mut self, source: ContextId) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether this notification concerns the given slot.
    pub fn is_for(&self, slot: &SlotName) -> bool {
        slot == self.key.as_str()
    }

    /// Parses the carried value. A missing or empty value reads as `{}`.
    pub fn parse_state(&self) -> crate::Result<StateValue> {
        match self.new_value.as_deref() {
            None | Some("") => Ok(empty_state()),
            Some(raw) => Ok(serde_json::from_str(raw)?),
        }
    }
}
