//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`WardEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use wardwatch_core::types::DbId;

/// A patient's recorded tier changed.
pub const EVENT_TRIAGE_CHANGED: &str = "triage.changed";

/// An escalation notification was raised for a patient.
pub const EVENT_TRIAGE_ESCALATED: &str = "triage.escalated";

// ---------------------------------------------------------------------------
// WardEvent
// ---------------------------------------------------------------------------

/// A domain event that occurred on the ward.
///
/// Constructed via [`WardEvent::new`] and enriched with
/// [`with_patient`](WardEvent::with_patient) and
/// [`with_payload`](WardEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardEvent {
    /// Dot-separated event name, e.g. `"triage.changed"`.
    pub event_type: String,

    /// Patient the event concerns, if any.
    pub patient_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl WardEvent {
    /// Create a new event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            patient_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_patient(mut self, patient_id: DbId) -> Self {
        self.patient_id = Some(patient_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`WardEvent`].
///
/// ```rust
/// use wardwatch_events::bus::{EventBus, WardEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(WardEvent::new("triage.changed"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<WardEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it. With no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: WardEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WardEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let event = WardEvent::new(EVENT_TRIAGE_CHANGED)
            .with_patient(42)
            .with_payload(serde_json::json!({"tier": "HIGH"}));

        assert_eq!(bus.publish(event), 1);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, EVENT_TRIAGE_CHANGED);
        assert_eq!(received.patient_id, Some(42));
        assert_eq!(received.payload["tier"], "HIGH");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(WardEvent::new("multi.test"));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event_type, "multi.test");
        assert_eq!(e2.event_type, "multi.test");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(WardEvent::new("orphan.event")), 0);
    }

    #[test]
    fn default_event_has_empty_optional_fields() {
        let event = WardEvent::new("bare.event");
        assert!(event.patient_id.is_none());
        assert!(event.payload.is_object());
    }
}
