//! Relays event bus traffic to WebSocket clients.

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;
use wardwatch_events::WardEvent;

use crate::ws::WsManager;

/// Serialize every [`WardEvent`] on `receiver` as a JSON text frame and
/// broadcast it to all consoles.
///
/// Exits when the event bus is dropped.
pub async fn forward_events(ws_manager: Arc<WsManager>, mut receiver: broadcast::Receiver<WardEvent>) {
    loop {
        match receiver.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => {
                    let sent = ws_manager.broadcast(Message::Text(json.into())).await;
                    tracing::trace!(event_type = %event.event_type, sent, "Event forwarded");
                }
                Err(e) => {
                    tracing::error!(event_type = %event.event_type, error = %e, "Failed to serialize event");
                }
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Event forwarder lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Event bus closed, event forwarder shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wardwatch_events::{EventBus, EVENT_TRIAGE_CHANGED};

    #[tokio::test]
    async fn events_reach_connected_consoles() {
        let bus = EventBus::default();
        let manager = Arc::new(WsManager::new());
        let mut console = manager.add("console".to_string()).await;

        let handle = tokio::spawn(forward_events(Arc::clone(&manager), bus.subscribe()));
        bus.publish(WardEvent::new(EVENT_TRIAGE_CHANGED).with_patient(7));

        let Some(Message::Text(text)) = console.recv().await else {
            panic!("expected a text frame");
        };
        let json: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(json["event_type"], EVENT_TRIAGE_CHANGED);
        assert_eq!(json["patient_id"], 7);

        drop(bus);
        handle.await.unwrap();
    }
}
