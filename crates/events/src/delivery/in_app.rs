//! In-app delivery: publishes the notification on the [`EventBus`] so the
//! API can push it to connected ward consoles.

use std::sync::Arc;

use async_trait::async_trait;
use wardwatch_core::channels::CHANNEL_IN_APP;
use wardwatch_core::notification::EscalationNotification;

use super::{DeliveryError, NotificationSink};
use crate::bus::{EventBus, WardEvent, EVENT_TRIAGE_ESCALATED};

pub struct InAppDelivery {
    bus: Arc<EventBus>,
}

impl InAppDelivery {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl NotificationSink for InAppDelivery {
    fn channel(&self) -> &'static str {
        CHANNEL_IN_APP
    }

    async fn deliver(&self, notification: &EscalationNotification) -> Result<(), DeliveryError> {
        let payload = serde_json::to_value(notification).map_err(|e| DeliveryError::Unavailable {
            channel: CHANNEL_IN_APP,
            reason: e.to_string(),
        })?;

        let event = WardEvent::new(EVENT_TRIAGE_ESCALATED)
            .with_patient(notification.patient_id)
            .with_payload(payload)
            .at(notification.created_at);

        if self.bus.publish(event) == 0 {
            return Err(DeliveryError::Unavailable {
                channel: CHANNEL_IN_APP,
                reason: "no connected listeners".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use wardwatch_core::triage::{Tier, TriageAssessment};
    use wardwatch_core::vitals::VitalSign;

    fn notification() -> EscalationNotification {
        let assessment = TriageAssessment {
            tier: Tier::High,
            abnormal_signals: BTreeSet::from([VitalSign::SystolicBp, VitalSign::DiastolicBp]),
            score: 2,
        };
        EscalationNotification::for_escalation(9, "John Doe", "ward-4", &assessment, chrono::Utc::now())
    }

    #[tokio::test]
    async fn publishes_escalation_event() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let sink = InAppDelivery::new(Arc::clone(&bus));

        sink.deliver(&notification()).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type, EVENT_TRIAGE_ESCALATED);
        assert_eq!(event.patient_id, Some(9));
        assert_eq!(event.payload["title"], "High Priority Warning: John Doe");
    }

    #[tokio::test]
    async fn fails_without_listeners() {
        let sink = InAppDelivery::new(Arc::new(EventBus::default()));
        let err = sink.deliver(&notification()).await.unwrap_err();
        assert!(err.to_string().contains("in_app channel unavailable"));
    }
}
