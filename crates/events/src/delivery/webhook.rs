//! Webhook delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] POSTs a JSON-encoded [`EscalationNotification`] to a
//! configured URL. Failed attempts are retried three times with exponential
//! backoff (1 s, 2 s, 4 s).

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use wardwatch_core::channels::CHANNEL_WEBHOOK;
use wardwatch_core::notification::EscalationNotification;

use super::{DeliveryError, NotificationSink};

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

/// Delivers escalation notifications to one external webhook endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
}

impl WebhookDelivery {
    /// Create a delivery service targeting `url`.
    pub fn new(url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Deliver with retry. Returns `Ok(())` on the first successful attempt.
    pub async fn send(&self, notification: &EscalationNotification) -> Result<(), WebhookError> {
        let payload = serde_json::json!({
            "recipient": notification.recipient,
            "title": notification.title,
            "body": notification.body,
            "metadata": notification.metadata,
            "patient_id": notification.patient_id,
            "tier": notification.tier,
            "abnormal_signals": notification.abnormal_signals,
            "timestamp": notification.created_at,
        });

        let delays = RETRY_DELAYS_SECS.map(Duration::from_secs);
        send_with_retry(&self.url, &delays, || self.try_send(&payload)).await
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), WebhookError> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Run `attempt` once per delay, sleeping after each failure, then once more.
/// The error returned is the one from the final attempt.
async fn send_with_retry<F, Fut>(
    url: &str,
    delays: &[Duration],
    mut attempt: F,
) -> Result<(), WebhookError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), WebhookError>>,
{
    for (n, delay) in delays.iter().enumerate() {
        match attempt().await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(
                    attempt = n + 1,
                    url = %url,
                    error = %e,
                    "Webhook delivery attempt failed, retrying"
                );
                tokio::time::sleep(*delay).await;
            }
        }
    }

    attempt().await.map_err(|e| {
        tracing::error!(url = %url, error = %e, "Webhook delivery failed after all retries");
        e
    })
}

#[async_trait]
impl NotificationSink for WebhookDelivery {
    fn channel(&self) -> &'static str {
        CHANNEL_WEBHOOK
    }

    async fn deliver(&self, notification: &EscalationNotification) -> Result<(), DeliveryError> {
        self.send(notification).await.map_err(DeliveryError::from)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
