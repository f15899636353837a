//! Reconciliation listener: folds broadcasts for one slot into local state.

use crate::error::{SyncError, SyncResult};
use crate::observe::StateCell;
use crate::status::{ErrorStatus, Operation};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tabstate_storage::ChangeBus;
use tabstate_types::SlotName;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Subscribes to a bus on behalf of one slot.
pub struct ReconciliationListener;

impl ReconciliationListener {
    /// Starts listening for notifications about `slot`.
    ///
    /// The subscription is taken before this returns, so no notification
    /// published afterwards is missed. Notifications for other slots are
    /// ignored; a missing value reads as `{}`. Parsed values go to
    /// `on_update`, parse failures to `on_error`.
    pub fn attach<U, E>(
        bus: &ChangeBus,
        slot: SlotName,
        on_update: U,
        on_error: E,
    ) -> SyncResult<ListenerHandle>
    where
        U: Fn(Value) + Send + Sync + 'static,
        E: Fn(SyncError) + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let mut rx = bus.subscribe();
        let active = Arc::new(AtomicBool::new(true));

        let task_active = Arc::clone(&active);
        let task_slot = slot.clone();
        let task = runtime.spawn(async move {
            loop {
                let notification = match rx.recv().await {
                    Ok(notification) => notification,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(slot = %task_slot, skipped, "Listener lagged behind the change bus");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if !notification.is_for(&task_slot) {
                    trace!(slot = %task_slot, key = %notification.key, "Ignoring notification for another slot");
                    continue;
                }
                let parsed = notification.parse_state();
                if !task_active.load(Ordering::Acquire) {
                    break;
                }
                match parsed {
                    Ok(value) => on_update(value),
                    Err(e) => on_error(e.into()),
                }
            }
            debug!(slot = %task_slot, "Listener stopped");
        });

        debug!(%slot, "Listener attached");
        Ok(ListenerHandle {
            slot,
            active,
            task: Mutex::new(Some(task)),
        })
    }
}

/// Keeps a listener alive. Detaches on drop.
#[derive(Debug)]
pub struct ListenerHandle {
    slot: SlotName,
    active: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ListenerHandle {
    /// The slot being listened to.
    pub fn slot(&self) -> &SlotName {
        &self.slot
    }

    /// Whether the listener still delivers updates.
    pub fn is_attached(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stops delivering updates. Safe to call any number of times; a
    /// notification already in flight is dropped, not delivered.
    pub fn detach(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
        debug!(slot = %self.slot, "Listener detached");
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Attaches a listener that replaces `cell` wholesale with every update for
/// `slot` and records parse failures in `status`.
pub(crate) fn follow(
    bus: &ChangeBus,
    slot: &SlotName,
    cell: &StateCell,
    status: &ErrorStatus,
) -> SyncResult<ListenerHandle> {
    let update_cell = cell.clone();
    let update_slot = slot.clone();
    let error_status = status.clone();
    ReconciliationListener::attach(
        bus,
        slot.clone(),
        move |value| {
            if update_cell.replace_if_changed(value) {
                debug!(slot = %update_slot, "Reconciled state from broadcast");
            } else {
                trace!(slot = %update_slot, "Broadcast matches local state");
            }
        },
        move |err| error_status.record(Operation::RemoteUpdate, &err),
    )
}
