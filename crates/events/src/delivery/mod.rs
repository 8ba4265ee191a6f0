//! Delivery channels for escalation notifications.
//!
//! Every channel implements [`NotificationSink`]. Delivery is best-effort:
//! callers log a [`DeliveryError`] and move on.

pub mod email;
pub mod in_app;
pub mod webhook;

use async_trait::async_trait;
use wardwatch_core::notification::EscalationNotification;

use self::email::EmailError;
use self::webhook::WebhookError;

/// Error type for any notification channel.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Email(#[from] EmailError),

    /// The channel accepted nothing (e.g. no listeners, closed transport).
    #[error("{channel} channel unavailable: {reason}")]
    Unavailable {
        channel: &'static str,
        reason: String,
    },
}

/// A destination for escalation notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Channel name (see `wardwatch_core::channels`).
    fn channel(&self) -> &'static str;

    async fn deliver(&self, notification: &EscalationNotification) -> Result<(), DeliveryError>;
}
