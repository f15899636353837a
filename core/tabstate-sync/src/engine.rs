//! Synchronization engine. Owns one state and keeps it in step with its
//! storage slot and with every other context of the origin.
//!
//! The engine moves through two phases. While **bootstrapping** it reads the
//! slot, merges the persisted value over the initial one and writes the result
//! back; once that write has completed (successfully or not) it is **active**
//! for the rest of its life.
//!
//! Local mutations go through the [`Observed`] returned by
//! [`SyncEngine::state`] and persist the whole snapshot. Actions and control
//! operations only write; the local state follows when the write's own
//! broadcast comes back through the listener, exactly as it would for a write
//! made by another context.

use crate::error::{SyncError, SyncResult};
use crate::gateway::{PendingWrite, PersistenceGateway, SlotWriter};
use crate::listener::{follow, ListenerHandle};
use crate::observe::{ChangeHook, Observed, StateCell};
use crate::status::{ErrorStatus, Failure, Operation};
use crate::updaters::{ActionSet, Updaters};
use crate::views::{ReadView, WriteView};
use serde_json::Value;
use std::sync::Arc;
use tabstate_storage::{KeyValueStorage, StorageOrigin};
use tabstate_types::{empty_state, shallow_merge, ContextId, SlotConfig, SlotName};
use tokio::sync::watch;
use tracing::{debug, info};

/// Lifecycle phase of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// The initial read/merge/write has not completed yet.
    Bootstrapping,
    /// Steady state.
    Active,
}

/// Construction options for an engine.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// State used where nothing is persisted. Defaults to `{}`.
    pub initial: Value,
    /// Slot configuration.
    pub config: SlotConfig,
    /// Updaters to bind as actions.
    pub updaters: Updaters,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            initial: empty_state(),
            config: SlotConfig::default(),
            updaters: Updaters::default(),
        }
    }
}

impl EngineOptions {
    /// Options with every default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial state.
    #[must_use]
    pub fn initial(mut self, initial: Value) -> Self {
        self.initial = initial;
        self
    }

    /// Sets the slot configuration.
    #[must_use]
    pub fn config(mut self, config: SlotConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the updater table.
    #[must_use]
    pub fn updaters(mut self, updaters: Updaters) -> Self {
        self.updaters = updaters;
        self
    }

    /// Adds one callable updater.
    #[must_use]
    pub fn updater<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.updaters = self.updaters.with(name, f);
        self
    }
}

/// The three control operations shared by the engine and its write view.
#[derive(Debug, Clone)]
pub(crate) struct Controls {
    cell: StateCell,
    writer: SlotWriter,
    initial: Arc<Value>,
}

impl Controls {
    /// Persists `{ ...current, ...initial }`.
    pub(crate) fn reset_initial(&self) {
        let next = shallow_merge(&self.cell.snapshot(), &self.initial);
        self.writer.persist(&next, Operation::ResetInitial);
    }

    /// Persists exactly the initial state.
    pub(crate) fn only_current_initial(&self) {
        self.writer
            .persist(self.initial.as_ref(), Operation::OnlyCurrentInitial);
    }

    /// Persists `{}`.
    pub(crate) fn delete_state(&self) {
        self.writer.persist(&empty_state(), Operation::DeleteState);
    }
}

/// Keeps one state value synchronized with a storage slot.
pub struct SyncEngine {
    context: ContextId,
    config: SlotConfig,
    slot: SlotName,
    cell: StateCell,
    writer: SlotWriter,
    status: ErrorStatus,
    phase: Arc<watch::Sender<EnginePhase>>,
    controls: Controls,
    actions: ActionSet,
    listener: ListenerHandle,
}

impl SyncEngine {
    /// Creates an engine and starts bootstrapping its slot.
    ///
    /// Must be called inside a tokio runtime. Fails only on a malformed
    /// updater table (or without a runtime); storage trouble during
    /// bootstrap lands in the error status instead.
    pub fn new(origin: &StorageOrigin, options: EngineOptions) -> SyncResult<Self> {
        let EngineOptions {
            initial,
            config,
            updaters,
        } = options;

        let context = ContextId::new();
        let slot = config.resolve();
        let storage = origin.storage(config.kind);
        let status = ErrorStatus::new();
        let cell = StateCell::new(initial.clone());

        let gateway =
            PersistenceGateway::spawn(Arc::clone(&storage), origin.bus().clone(), context)?;
        let writer = SlotWriter::new(gateway, slot.clone(), status.clone());
        let actions = ActionSet::bind(&updaters, &cell, &writer)?;
        let listener = follow(origin.bus(), &slot, &cell, &status)?;
        let (phase, _) = watch::channel(EnginePhase::Bootstrapping);

        let engine = Self {
            context,
            config,
            slot,
            cell: cell.clone(),
            writer: writer.clone(),
            status,
            phase: Arc::new(phase),
            controls: Controls {
                cell,
                writer,
                initial: Arc::new(initial),
            },
            actions,
            listener,
        };
        engine.bootstrap(storage.as_ref());

        info!(
            slot = %engine.slot,
            context = %engine.context,
            actions = engine.actions.len(),
            "Sync engine created"
        );
        Ok(engine)
    }

    fn bootstrap(&self, storage: &dyn KeyValueStorage) {
        let initial = self.controls.initial.as_ref();
        let stored = match storage.get_item(self.slot.as_str()) {
            Ok(stored) => stored,
            Err(e) => {
                self.status
                    .record(Operation::LoadInitialState, &SyncError::from(e));
                self.phase.send_replace(EnginePhase::Active);
                return;
            }
        };

        let (seed, operation) = match stored.as_deref() {
            None | Some("") => (initial.clone(), Operation::SetInitialState),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(persisted) => (
                    shallow_merge(initial, &persisted),
                    Operation::LoadInitialState,
                ),
                Err(e) => {
                    self.status
                        .record(Operation::LoadInitialState, &SyncError::Parse(e));
                    (initial.clone(), Operation::SetInitialState)
                }
            },
        };
        debug!(slot = %self.slot, ?operation, "Bootstrapping slot");

        self.cell.replace_if_changed(seed.clone());
        let phase = Arc::clone(&self.phase);
        self.writer.persist_then(&seed, operation, move || {
            phase.send_replace(EnginePhase::Active);
        });
    }

    // ── State ────────────────────────────────────────────────────

    /// The state, wrapped so that every effective mutation persists the
    /// whole snapshot.
    pub fn state(&self) -> Observed {
        Observed::over(self.cell.clone(), self.persist_hook())
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> Value {
        self.cell.snapshot()
    }

    /// Subscribes to local state changes, e.g. to re-render a view.
    pub fn subscribe(&self) -> watch::Receiver<Value> {
        self.cell.subscribe()
    }

    fn persist_hook(&self) -> ChangeHook {
        let cell = self.cell.clone();
        let writer = self.writer.clone();
        Arc::new(move || writer.persist(&cell.snapshot(), Operation::SetGlobalState))
    }

    // ── Actions ──────────────────────────────────────────────────

    /// The bound actions.
    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Calls an action by name.
    pub fn dispatch(&self, name: &str, args: &[Value]) -> SyncResult<()> {
        self.actions.dispatch(name, args)
    }

    // ── Control operations ───────────────────────────────────────

    /// Persists `{ ...current, ...initial }`: initial values win.
    pub fn reset_initial(&self) {
        self.controls.reset_initial();
    }

    /// Persists exactly the initial state, discarding everything else.
    pub fn only_current_initial(&self) {
        self.controls.only_current_initial();
    }

    /// Persists an empty state.
    pub fn delete_state(&self) {
        self.controls.delete_state();
    }

    // ── Status ───────────────────────────────────────────────────

    /// Whether any asynchronous operation has failed.
    pub fn is_error(&self) -> bool {
        self.status.is_error()
    }

    /// Message of the most recent failure.
    pub fn error_message(&self) -> Option<String> {
        self.status.error_message()
    }

    /// The most recent failure.
    pub fn last_failure(&self) -> Option<Failure> {
        self.status.last_failure()
    }

    /// Subscribes to failures.
    pub fn subscribe_status(&self) -> watch::Receiver<Option<Failure>> {
        self.status.subscribe()
    }

    /// The shared error status.
    pub fn status(&self) -> &ErrorStatus {
        &self.status
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Current phase.
    pub fn phase(&self) -> EnginePhase {
        *self.phase.borrow()
    }

    /// Waits until bootstrapping has completed.
    pub async fn ready(&self) {
        let mut rx = self.phase.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|phase| *phase == EnginePhase::Active).await;
    }

    /// Resolves once every write issued so far has been stored and broadcast.
    pub fn flush(&self) -> PendingWrite {
        self.writer.flush()
    }

    /// Stops following broadcasts. Idempotent; also happens on drop.
    pub fn teardown(&self) {
        if self.listener.is_attached() {
            self.listener.detach();
            info!(slot = %self.slot, context = %self.context, "Sync engine torn down");
        }
    }

    /// Whether the engine still follows broadcasts.
    pub fn is_attached(&self) -> bool {
        self.listener.is_attached()
    }

    // ── Accessors ────────────────────────────────────────────────

    /// The slot this engine owns.
    pub fn slot(&self) -> &SlotName {
        &self.slot
    }

    /// The configuration it was built with.
    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    /// This engine's context id.
    pub fn context_id(&self) -> ContextId {
        self.context
    }

    /// The initial state.
    pub fn initial(&self) -> &Value {
        &self.controls.initial
    }

    // ── Views ────────────────────────────────────────────────────

    /// A read-only view: state and status.
    pub fn read_view(&self) -> ReadView {
        ReadView::new(self.state(), self.status.clone())
    }

    /// A write-only view: control operations, actions and status.
    pub fn write_view(&self) -> WriteView {
        WriteView::new(
            self.controls.clone(),
            self.actions.clone(),
            self.status.clone(),
        )
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("context", &self.context)
            .field("slot", &self.slot)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
