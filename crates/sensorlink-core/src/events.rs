//! Outbound event bus for readings and connection changes.
//!
//! Drivers publish every accepted notification as a [`DeviceEvent::Reading`].
//! Publishing is fire-and-forget: with no receivers the event is dropped,
//! and slow receivers observe `Lagged` rather than stalling the publisher.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use sensorlink_types::{DeviceFamily, Reading};

/// Identity of the device an event concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceId {
    /// Device identifier.
    pub id: String,
    /// Device address on the transport.
    pub address: String,
    /// Device family.
    pub family: DeviceFamily,
}

/// Events emitted by drivers.
///
/// All events are serializable for logging, persistence, and IPC.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new event types
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum DeviceEvent {
    /// The device link came up.
    Connected { device: DeviceId },
    /// The device link went down.
    Disconnected { device: DeviceId },
    /// A subscription was re-established after a reconnect.
    Resubscribed { device: DeviceId, component: String },
    /// A new reading arrived from a subscription.
    Reading { reading: Reading },
}

impl DeviceEvent {
    /// The reading carried by the event, if any.
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::Reading { reading } => Some(reading),
            _ => None,
        }
    }
}

/// Sender for device events.
pub type EventSender = broadcast::Sender<DeviceEvent>;

/// Receiver for device events.
pub type EventReceiver = broadcast::Receiver<DeviceEvent>;

/// Default event channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Event dispatcher for sending events to multiple receivers.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sender: EventSender,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Send an event.
    pub fn send(&self, event: DeviceEvent) {
        // Ignore error if no receivers
        let _ = self.sender.send(event);
    }

    /// Get the number of active receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reading() -> Reading {
        Reading {
            device_id: "ble_AABB".into(),
            component: "Temperature".into(),
            value: "21.5".into(),
            unit: String::new(),
            timestamp: 1,
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_all_receivers() {
        let events = EventDispatcher::new(8);
        let mut a = events.subscribe();
        let mut b = events.subscribe();
        assert_eq!(events.receiver_count(), 2);

        events.send(DeviceEvent::Reading {
            reading: sample_reading(),
        });

        assert_eq!(a.recv().await.unwrap().reading(), Some(&sample_reading()));
        assert_eq!(b.recv().await.unwrap().reading(), Some(&sample_reading()));
    }

    #[test]
    fn test_send_without_receivers_is_silent() {
        let events = EventDispatcher::default();
        events.send(DeviceEvent::Reading {
            reading: sample_reading(),
        });
        assert_eq!(events.receiver_count(), 0);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = DeviceEvent::Connected {
            device: DeviceId {
                id: "ble_AABB".into(),
                address: "AA:BB".into(),
                family: DeviceFamily::ModosmartTest,
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "connected");
        assert_eq!(json["device"]["family"], "ModosmartTest");
    }
}
