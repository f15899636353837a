//! Broadcast channel for change notifications.

use tabstate_types::ChangeNotification;
use tokio::sync::broadcast;
use tracing::trace;

/// Notifications buffered per subscriber before it starts lagging.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Publish/subscribe channel shared by every context of a storage origin.
///
/// Cloning yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeNotification>,
}

impl ChangeBus {
    /// Creates a bus with [`DEFAULT_BUS_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` notifications per subscriber.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes a notification to every current subscriber.
    /// Returns how many subscribers it reached.
    pub fn publish(&self, notification: ChangeNotification) -> usize {
        let key = notification.key.clone();
        // Sending only fails when nobody listens, which is not an error here.
        let reached = self.tx.send(notification).unwrap_or(0);
        trace!(%key, reached, "Published change notification");
        reached
    }

    /// Subscribes to notifications published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeNotification> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
