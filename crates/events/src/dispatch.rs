//! Fire-and-forget fan-out of escalation notifications.
//!
//! [`NotificationDispatcher`] hands each notification to every configured
//! [`NotificationSink`] on a spawned task. Failures are logged and counted,
//! never returned to the caller that triggered the escalation.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use wardwatch_core::notification::EscalationNotification;

use crate::delivery::NotificationSink;

/// Outcome of delivering one notification to all sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub delivered: Vec<&'static str>,
    pub failed: Vec<&'static str>,
}

#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn channels(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.channel()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Deliver to every sink in order, logging each failure.
    pub async fn deliver_all(&self, notification: &EscalationNotification) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for sink in &self.sinks {
            let channel = sink.channel();
            match sink.deliver(notification).await {
                Ok(()) => {
                    tracing::debug!(
                        channel,
                        patient_id = notification.patient_id,
                        "Escalation notification delivered"
                    );
                    report.delivered.push(channel);
                }
                Err(e) => {
                    tracing::warn!(
                        channel,
                        patient_id = notification.patient_id,
                        tier = %notification.tier,
                        error = %e,
                        "Escalation notification delivery failed"
                    );
                    report.failed.push(channel);
                }
            }
        }

        report
    }

    /// Spawn delivery in the background and return immediately.
    ///
    /// The handle is only useful to tests and shutdown code; dropping it does
    /// not cancel delivery.
    pub fn dispatch(&self, notification: EscalationNotification) -> JoinHandle<DeliveryReport> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver_all(&notification).await })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
