//! Updaters and the actions bound to them.
//!
//! An updater is a pure function `(current state, args) -> new state`. At
//! engine construction every updater is bound into an [`Action`] which, when
//! called, feeds the current snapshot through the updater and persists the
//! result. The table is validated as a whole before any action exists: a
//! single non-callable entry fails the binding.

use crate::error::{SyncError, SyncResult};
use crate::gateway::SlotWriter;
use crate::observe::StateCell;
use crate::status::Operation;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A pure state transition.
pub type UpdaterFn = Arc<dyn Fn(&Value, &[Value]) -> Value + Send + Sync>;

/// One entry of an updater table.
#[derive(Clone)]
pub enum UpdaterEntry {
    /// A callable updater.
    Function(UpdaterFn),
    /// A non-callable entry, as found in tables assembled from dynamic data.
    /// Rejected when actions are bound.
    Literal(Value),
}

impl UpdaterEntry {
    /// Wraps a closure.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Whether this entry can be bound to an action.
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

impl From<Value> for UpdaterEntry {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

impl From<UpdaterFn> for UpdaterEntry {
    fn from(f: UpdaterFn) -> Self {
        Self::Function(f)
    }
}

impl fmt::Debug for UpdaterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(_) => f.write_str("Function(..)"),
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
        }
    }
}

/// A named table of updaters.
#[derive(Debug, Clone, Default)]
pub struct Updaters {
    entries: BTreeMap<String, UpdaterEntry>,
}

impl Updaters {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a callable updater.
    #[must_use]
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), UpdaterEntry::function(f));
        self
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: impl Into<UpdaterEntry>) {
        self.entries.insert(name.into(), entry.into());
    }

    /// Entry names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, UpdaterEntry)> for Updaters {
    fn from_iter<I: IntoIterator<Item = (S, UpdaterEntry)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, entry)| (name.into(), entry))
                .collect(),
        }
    }
}

/// An updater bound to a state and a slot.
#[derive(Clone)]
pub struct Action {
    name: String,
    updater: UpdaterFn,
    cell: StateCell,
    writer: SlotWriter,
}

impl Action {
    /// The action's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the updater to the current state and persists the result.
    /// Local state follows once the write is broadcast back.
    pub fn call(&self, args: &[Value]) {
        let current = self.cell.snapshot();
        let next = (self.updater)(&current, args);
        debug!(action = %self.name, slot = %self.writer.slot(), "Dispatching action");
        self.writer.persist(&next, Operation::SetGlobalState);
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The actions of one engine, by name.
#[derive(Debug, Clone, Default)]
pub struct ActionSet {
    actions: BTreeMap<String, Action>,
}

impl ActionSet {
    /// Binds every updater in the table. Fails with
    /// [`SyncError::Configuration`] on an empty name or a non-callable entry.
    pub fn bind(updaters: &Updaters, cell: &StateCell, writer: &SlotWriter) -> SyncResult<Self> {
        let mut actions = BTreeMap::new();
        for (name, entry) in &updaters.entries {
            if name.is_empty() {
                return Err(SyncError::Configuration(
                    "action names must not be empty".to_string(),
                ));
            }
            let updater = match entry {
                UpdaterEntry::Function(f) => Arc::clone(f),
                UpdaterEntry::Literal(value) => {
                    return Err(SyncError::Configuration(format!(
                        "the action `{name}` is not a function (found {value})"
                    )));
                }
            };
            actions.insert(
                name.clone(),
                Action {
                    name: name.clone(),
                    updater,
                    cell: cell.clone(),
                    writer: writer.clone(),
                },
            );
        }
        Ok(Self { actions })
    }

    /// Looks up an action.
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Calls an action by name.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> SyncResult<()> {
        let action = self
            .get(name)
            .ok_or_else(|| SyncError::UnknownAction(name.to_string()))?;
        action.call(args);
        Ok(())
    }

    /// Action names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether there are no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
