//! Error status: the non-throwing channel through which asynchronous
//! failures reach the consumer.
//!
//! Every fire-and-forget operation carries an [`Operation`] classification.
//! When it fails, the classification and the error are folded into a
//! human-readable message and stored as the most recent [`Failure`]. The
//! status is never cleared by later successes.

use crate::error::SyncError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// The operation an asynchronous failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Seeding an empty slot with the initial state.
    SetInitialState,
    /// Merging a persisted value with the initial state at bootstrap.
    LoadInitialState,
    /// Persisting a mutation or an action result.
    SetGlobalState,
    /// `reset_initial`.
    ResetInitial,
    /// `only_current_initial`.
    OnlyCurrentInitial,
    /// `delete_state`.
    DeleteState,
    /// Folding a broadcast into local state.
    RemoteUpdate,
}

impl Operation {
    /// Human-readable description used in error messages.
    pub const fn description(&self) -> &'static str {
        match self {
            Self::SetInitialState => "set of the initial state of the global state",
            Self::LoadInitialState => "loading of the initial state of the global state",
            Self::SetGlobalState => "set of the global state",
            Self::ResetInitial => "reset to current initial state",
            Self::OnlyCurrentInitial => "reset to only current initial state",
            Self::DeleteState => "delete of the global state",
            Self::RemoteUpdate => "update changes of the global state",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A recorded failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// What was being attempted.
    pub operation: Operation,
    /// Full message, `Error in the <operation>: <error>`.
    pub message: String,
}

impl Failure {
    /// Builds a failure from an operation and the error it hit.
    pub fn new(operation: Operation, error: &SyncError) -> Self {
        Self {
            operation,
            message: format!("Error in the {operation}: {error}"),
        }
    }
}

/// Shared holder of the most recent failure.
///
/// Cloning yields another handle to the same status.
#[derive(Debug, Clone)]
pub struct ErrorStatus {
    inner: Arc<watch::Sender<Option<Failure>>>,
}

impl ErrorStatus {
    /// Creates a clean status.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { inner: Arc::new(tx) }
    }

    /// Records a failure, replacing any previous one.
    pub fn record(&self, operation: Operation, error: &SyncError) {
        let failure = Failure::new(operation, error);
        warn!("{}", failure.message);
        self.inner.send_replace(Some(failure));
    }

    /// Whether any failure has been recorded.
    pub fn is_error(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// The most recent failure message.
    pub fn error_message(&self) -> Option<String> {
        self.inner.borrow().as_ref().map(|f| f.message.clone())
    }

    /// The most recent failure.
    pub fn last_failure(&self) -> Option<Failure> {
        self.inner.borrow().clone()
    }

    /// Subscribes to status changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Failure>> {
        self.inner.subscribe()
    }
}

impl Default for ErrorStatus {
    fn default() -> Self {
        Self::new()
    }
}
