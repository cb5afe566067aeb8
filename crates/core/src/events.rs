//! Event system for save/load lifecycle notifications
//!
//! Publishers fire events around every facade operation; subscribers attach
//! via a broadcast channel. Publishing with no subscribers is a no-op, so the
//! storage layer never blocks or fails on event delivery.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::error;

/// Save/load lifecycle events fired by the facade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageEvent {
    /// A value is about to be serialized and written
    Saving { identifier: String },
    /// A value was written and committed
    Saved { identifier: String },
    /// A value is about to be read and deserialized
    Loading { identifier: String },
    /// A value was read and deserialized
    Loaded { identifier: String },
    /// A value is about to be deserialized into an existing target
    LoadingInto { identifier: String },
    /// A value was deserialized into an existing target
    LoadedInto { identifier: String },
}

impl StorageEvent {
    /// The identifier the event refers to
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            StorageEvent::Saving { identifier }
            | StorageEvent::Saved { identifier }
            | StorageEvent::Loading { identifier }
            | StorageEvent::Loaded { identifier }
            | StorageEvent::LoadingInto { identifier }
            | StorageEvent::LoadedInto { identifier } => identifier,
        }
    }
}

/// Broadcast-based event bus
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: StorageEvent) {
        if let Err(e) = self.sender.send(event) {
            // Only log if there are supposed to be receivers
            if self.sender.receiver_count() > 0 {
                error!("Failed to broadcast storage event: {}", e);
            }
        }
    }

    /// Subscribe to events via the broadcast channel
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(StorageEvent::Saving {
            identifier: "player/save1".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.identifier(), "player/save1");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let bus = EventBus::default();
        bus.publish(StorageEvent::Saved {
            identifier: "x".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
