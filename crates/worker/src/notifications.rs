//! Assembles the notification dispatcher from configuration.

use std::sync::Arc;

use wardwatch_core::error::CoreError;
use wardwatch_events::{
    EmailConfig, EmailDelivery, EventBus, InAppDelivery, NotificationDispatcher, WebhookDelivery,
};

use crate::config::TriageConfig;

/// In-app delivery is added when a bus with console listeners is supplied.
/// The webhook sink is added when `TRIAGE_WEBHOOK_URL` is set, the email
/// sink when `SMTP_HOST` is set.
pub fn build_dispatcher(
    config: &TriageConfig,
    in_app: Option<Arc<EventBus>>,
    email: Option<EmailConfig>,
) -> Result<NotificationDispatcher, CoreError> {
    let mut dispatcher = NotificationDispatcher::new();

    if let Some(bus) = in_app {
        dispatcher = dispatcher.with_sink(Arc::new(InAppDelivery::new(bus)));
    }

    if let Some(url) = &config.webhook_url {
        let webhook = WebhookDelivery::new(url.clone())
            .map_err(|e| CoreError::Internal(format!("Failed to build webhook client: {e}")))?;
        dispatcher = dispatcher.with_sink(Arc::new(webhook));
    }

    if let Some(email) = email {
        dispatcher = dispatcher.with_sink(Arc::new(EmailDelivery::new(email)));
    }

    tracing::info!(channels = ?dispatcher.channels(), "Notification channels configured");
    Ok(dispatcher)
}
