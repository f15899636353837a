//! Persistence gateway: deferred, ordered writes with change broadcast.
//!
//! Each gateway owns one writer task. A write is serialized at the call site
//! (so it captures the value as it is *now*) and queued; the writer task then
//! stores it and publishes a [`ChangeNotification`] to every context of the
//! origin, the writer's own context included. Callers never wait on storage.
//!
//! Writes from one gateway are committed strictly in the order they were
//! issued. Nothing is coalesced and nothing is cancelled: once queued, a
//! write runs to completion even if its [`PendingWrite`] is dropped.

use crate::error::{SyncError, SyncResult};
use crate::status::{ErrorStatus, Operation};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tabstate_storage::{ChangeBus, KeyValueStorage};
use tabstate_types::{ChangeNotification, ContextId, SlotName};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Callback receiving the outcome of one write.
pub type WriteCallback = Box<dyn FnOnce(SyncResult<()>) + Send>;

enum Completion {
    Callback(WriteCallback),
    Notify(oneshot::Sender<SyncResult<()>>),
}

impl Completion {
    fn complete(self, result: SyncResult<()>) {
        match self {
            Self::Callback(callback) => callback(result),
            Self::Notify(tx) => {
                // The caller may have dropped its PendingWrite.
                let _ = tx.send(result);
            }
        }
    }
}

enum WriteRequest {
    Write {
        slot: SlotName,
        payload: SyncResult<String>,
        done: Completion,
    },
    Barrier(oneshot::Sender<SyncResult<()>>),
}

/// The outcome of a queued write, or of a flush.
///
/// Resolving it is optional; the write happens either way.
#[must_use = "the write is queued regardless; await this to observe its outcome"]
pub struct PendingWrite {
    rx: oneshot::Receiver<SyncResult<()>>,
}

impl PendingWrite {
    fn ready(result: SyncResult<()>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl Future for PendingWrite {
    type Output = SyncResult<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => Poll::Ready(Err(SyncError::ChannelClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWrite").finish_non_exhaustive()
    }
}

/// Serializes values into storage slots and announces every write.
///
/// Cloning yields another handle to the same writer task. The task ends once
/// every handle is dropped and the queue is drained.
#[derive(Clone)]
pub struct PersistenceGateway {
    tx: mpsc::UnboundedSender<WriteRequest>,
    context: ContextId,
}

impl PersistenceGateway {
    /// Starts a writer task on the current tokio runtime.
    pub fn spawn(
        storage: Arc<dyn KeyValueStorage>,
        bus: ChangeBus,
        context: ContextId,
    ) -> SyncResult<Self> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_writer(storage, bus, context, rx));
        Ok(Self { tx, context })
    }

    /// The context writes are attributed to.
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Queues a write of `value` to `slot`.
    pub fn write<T: Serialize + ?Sized>(&self, slot: &SlotName, value: &T) -> PendingWrite {
        let (tx, rx) = oneshot::channel();
        self.submit(slot, value, Completion::Notify(tx));
        PendingWrite { rx }
    }

    /// Queues a write of `value` to `slot` and hands its outcome to
    /// `on_done`, which runs on the writer task.
    pub fn write_then<T, F>(&self, slot: &SlotName, value: &T, on_done: F)
    where
        T: Serialize + ?Sized,
        F: FnOnce(SyncResult<()>) + Send + 'static,
    {
        self.submit(slot, value, Completion::Callback(Box::new(on_done)));
    }

    /// Resolves once every write queued before this call has completed.
    pub fn flush(&self) -> PendingWrite {
        let (tx, rx) = oneshot::channel();
        match self.tx.send(WriteRequest::Barrier(tx)) {
            Ok(()) => PendingWrite { rx },
            // No writer means nothing is pending.
            Err(_) => PendingWrite::ready(Ok(())),
        }
    }

    fn submit<T: Serialize + ?Sized>(&self, slot: &SlotName, value: &T, done: Completion) {
        let request = WriteRequest::Write {
            slot: slot.clone(),
            payload: serde_json::to_string(value).map_err(SyncError::from),
            done,
        };
        if let Err(mpsc::error::SendError(WriteRequest::Write { done, .. })) = self.tx.send(request)
        {
            done.complete(Err(SyncError::ChannelClosed));
        }
    }
}

impl fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

async fn run_writer(
    storage: Arc<dyn KeyValueStorage>,
    bus: ChangeBus,
    context: ContextId,
    mut rx: mpsc::UnboundedReceiver<WriteRequest>,
) {
    while let Some(request) = rx.recv().await {
        match request {
            WriteRequest::Write {
                slot,
                payload,
                done,
            } => {
                let result = payload
                    .and_then(|serialized| commit(storage.as_ref(), &bus, context, &slot, serialized));
                done.complete(result);
            }
            WriteRequest::Barrier(tx) => {
                let _ = tx.send(Ok(()));
            }
        }
    }
    debug!(%context, "Writer task finished");
}

fn commit(
    storage: &dyn KeyValueStorage,
    bus: &ChangeBus,
    context: ContextId,
    slot: &SlotName,
    serialized: String,
) -> SyncResult<()> {
    storage.set_item(slot.as_str(), &serialized)?;
    let reached = bus.publish(
        ChangeNotification::new(slot.as_str(), Some(serialized)).with_source(context),
    );
    debug!(%slot, %context, reached, "Persisted state");
    Ok(())
}

/// A gateway bound to one slot, routing failures to an error status.
#[derive(Debug, Clone)]
pub struct SlotWriter {
    gateway: PersistenceGateway,
    slot: SlotName,
    status: ErrorStatus,
}

impl SlotWriter {
    /// Binds a gateway to a slot and a status.
    pub fn new(gateway: PersistenceGateway, slot: SlotName, status: ErrorStatus) -> Self {
        Self {
            gateway,
            slot,
            status,
        }
    }

    /// The slot this writer targets.
    pub fn slot(&self) -> &SlotName {
        &self.slot
    }

    /// The status failures are recorded in.
    pub fn status(&self) -> &ErrorStatus {
        &self.status
    }

    /// Fire-and-forget write; a failure is recorded under `operation`.
    pub fn persist<T: Serialize + ?Sized>(&self, value: &T, operation: Operation) {
        self.persist_then(value, operation, || {});
    }

    /// Like [`persist`](Self::persist), then runs `then` whatever the outcome.
    pub fn persist_then<T, F>(&self, value: &T, operation: Operation, then: F)
    where
        T: Serialize + ?Sized,
        F: FnOnce() + Send + 'static,
    {
        let status = self.status.clone();
        self.gateway.write_then(&self.slot, value, move |result| {
            if let Err(e) = result {
                status.record(operation, &e);
            }
            then();
        });
    }

    /// Resolves once every write queued so far has completed.
    pub fn flush(&self) -> PendingWrite {
        self.gateway.flush()
    }
}
