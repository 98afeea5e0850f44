//! In-process realtime fan-out for freshly published notifications.

use tokio::sync::broadcast;
use tracing::{debug, trace};

use schoolhub_entity::notification::Notification;

/// Broadcast hub that WebSocket sessions subscribe to.
///
/// Delivery is at-most-once: a send with no subscribers is dropped, and a
/// receiver that lags behind the channel capacity loses the oldest
/// messages. Persisted rows stay authoritative.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    /// Create a hub buffering up to `capacity` messages per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to every notification published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish to all current subscribers. Returns how many received it.
    pub fn publish(&self, notification: &Notification) -> usize {
        match self.sender.send(notification.clone()) {
            Ok(receivers) => {
                trace!(notification_id = %notification.id, receivers, "Notification broadcast");
                receivers
            }
            Err(_) => {
                debug!(notification_id = %notification.id, "No realtime subscribers");
                0
            }
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(256)
    }
}
