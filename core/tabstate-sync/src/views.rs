//! Narrow views over an engine, and a watch-only state follower.

use crate::engine::Controls;
use crate::error::SyncResult;
use crate::listener::{follow, ListenerHandle};
use crate::observe::{Observed, StateCell};
use crate::status::ErrorStatus;
use crate::updaters::ActionSet;
use serde_json::Value;
use tabstate_storage::StorageOrigin;
use tabstate_types::{SlotConfig, SlotName};
use tokio::sync::watch;
use tracing::info;

/// Read access to an engine's state and status.
#[derive(Debug, Clone)]
pub struct ReadView {
    state: Observed,
    status: ErrorStatus,
}

impl ReadView {
    pub(crate) fn new(state: Observed, status: ErrorStatus) -> Self {
        Self { state, status }
    }

    /// The observed state.
    pub fn state(&self) -> &Observed {
        &self.state
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Value {
        self.state.cell().snapshot()
    }

    /// Whether any asynchronous operation has failed.
    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    /// Message of the most recent failure.
    pub fn error_message(&self) -> Option<String> {
        self.status.error_message()
    }
}

/// Write access to an engine: control operations and actions, plus status.
#[derive(Debug, Clone)]
pub struct WriteView {
    controls: Controls,
    actions: ActionSet,
    status: ErrorStatus,
}

impl WriteView {
    pub(crate) fn new(controls: Controls, actions: ActionSet, status: ErrorStatus) -> Self {
        Self {
            controls,
            actions,
            status,
        }
    }

    /// See [`SyncEngine::reset_initial`](crate::SyncEngine::reset_initial).
    pub fn reset_initial(&self) {
        self.controls.reset_initial();
    }

    /// See [`SyncEngine::only_current_initial`](crate::SyncEngine::only_current_initial).
    pub fn only_current_initial(&self) {
        self.controls.only_current_initial();
    }

    /// See [`SyncEngine::delete_state`](crate::SyncEngine::delete_state).
    pub fn delete_state(&self) {
        self.controls.delete_state();
    }

    /// The bound actions.
    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Calls an action by name.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> SyncResult<()> {
        self.actions.dispatch(name, args)
    }

    /// Whether any asynchronous operation has failed.
    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    /// Message of the most recent failure.
    pub fn error_message(&self) -> Option<String> {
        self.status.error_message()
    }
}

/// Follows a slot's broadcasts without touching storage.
///
/// Starts at `initial` and takes every value broadcast for the slot. It
/// never reads, seeds or writes the slot.
#[derive(Debug)]
pub struct StateWatcher {
    slot: SlotName,
    cell: StateCell,
    status: ErrorStatus,
    listener: ListenerHandle,
}

impl StateWatcher {
    /// Starts following the slot `config` resolves to.
    pub fn attach(origin: &StorageOrigin, config: &SlotConfig, initial: Value) -> SyncResult<Self> {
        let slot = config.resolve();
        let cell = StateCell::new(initial);
        let status = ErrorStatus::new();
        let listener = follow(origin.bus(), &slot, &cell, &status)?;
        info!(%slot, "State watcher attached");
        Ok(Self {
            slot,
            cell,
            status,
            listener,
        })
    }

    /// The slot being followed.
    pub fn slot(&self) -> &SlotName {
        &self.slot
    }

    /// A copy of the latest state.
    pub fn snapshot(&self) -> Value {
        self.cell.snapshot()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<Value> {
        self.cell.subscribe()
    }

    /// Whether a broadcast could not be parsed.
    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    /// Message of the most recent failure.
    pub fn error_message(&self) -> Option<String> {
        self.status.error_message()
    }

    /// Stops following. Idempotent; also happens on drop.
    pub fn detach(&self) {
        self.listener.detach();
    }
}
