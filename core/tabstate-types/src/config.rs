//! Slot configuration and key resolution.
//!
//! A slot is the storage location one engine owns. Its name is derived from
//! the `(group, key, kind)` triple by plain concatenation, so two engines
//! configured alike always land on the same slot.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical key used when the configuration does not name one.
pub const DEFAULT_KEY: &str = "globalState";

/// Which storage area a slot lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Durable across sessions.
    Local,
    /// Cleared when the owning context closes.
    #[default]
    Session,
}

impl StorageKind {
    /// Returns the lowercase name used in slot names.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Session => "session",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "session" => Ok(Self::Session),
            other => Err(Error::InvalidStorageKind(other.to_string())),
        }
    }
}

/// Configuration for one state slot.
///
/// Every field is optional when deserialized; missing fields take the
/// defaults (`""`, `session`, `"globalState"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Namespace prefix for the slot name.
    pub group: String,
    /// Storage area the slot lives in.
    pub kind: StorageKind,
    /// Logical key of the state.
    pub key: String,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            group: String::new(),
            kind: StorageKind::default(),
            key: DEFAULT_KEY.to_string(),
        }
    }
}

impl SlotConfig {
    /// Sets the group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Sets the storage kind.
    #[must_use]
    pub fn with_kind(mut self, kind: StorageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the logical key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Resolves the slot name for this configuration.
    pub fn resolve(&self) -> SlotName {
        resolve(self)
    }
}

/// Derives the slot name `group + key + kind` from a configuration.
pub fn resolve(config: &SlotConfig) -> SlotName {
    SlotName(format!("{}{}{}", config.group, config.key, config.kind))
}

/// Name of a storage slot, as produced by [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotName(String);

impl SlotName {
    /// Wraps an already-resolved slot name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SlotName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for SlotName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
