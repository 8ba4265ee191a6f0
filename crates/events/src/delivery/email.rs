//! Email notification delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! plain-text escalation emails. Configuration is loaded from environment
//! variables; if `SMTP_HOST` is not set, [`EmailConfig::from_env`] returns
//! `None` and no mailer should be constructed.

use async_trait::async_trait;
use wardwatch_core::channels::CHANNEL_EMAIL;
use wardwatch_core::notification::EscalationNotification;

use super::{DeliveryError, NotificationSink};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "triage@wardwatch.local";

/// Configuration for the SMTP email delivery service.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Mailbox used when the notification recipient is not an email address.
    pub fallback_to: Option<String>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set.
    ///
    /// | Variable        | Required | Default                   |
    /// |-----------------|----------|---------------------------|
    /// | `SMTP_HOST`     | yes      |                           |
    /// | `SMTP_PORT`     | no       | `587`                     |
    /// | `SMTP_FROM`     | no       | `triage@wardwatch.local`  |
    /// | `SMTP_TO`       | no       |                           |
    /// | `SMTP_USER`     | no       |                           |
    /// | `SMTP_PASSWORD` | no       |                           |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            fallback_to: std::env::var("SMTP_TO").ok(),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends escalation emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// The address to mail: the recipient if it parses as one, otherwise the
    /// configured fallback mailbox.
    fn resolve_recipient(&self, recipient: &str) -> Result<lettre::message::Mailbox, EmailError> {
        match recipient.parse() {
            Ok(mailbox) => Ok(mailbox),
            Err(e) => match &self.config.fallback_to {
                Some(fallback) => Ok(fallback.parse()?),
                None => Err(EmailError::Address(e)),
            },
        }
    }

    pub async fn send(&self, notification: &EscalationNotification) -> Result<(), EmailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials,
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        };

        let to = self.resolve_recipient(&notification.recipient)?;
        let body = format!(
            "{}\n\nPatient: {} (id {})\nTier: {}\nRole: {}\nTime: {}",
            notification.body,
            notification.patient_name,
            notification.patient_id,
            notification.tier,
            notification.metadata.role,
            notification.created_at,
        );

        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to)
            .subject(notification.title.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| EmailError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        tracing::info!(
            patient_id = notification.patient_id,
            tier = %notification.tier,
            "Escalation email sent"
        );
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for EmailDelivery {
    fn channel(&self) -> &'static str {
        CHANNEL_EMAIL
    }

    async fn deliver(&self, notification: &EscalationNotification) -> Result<(), DeliveryError> {
        self.send(notification).await.map_err(DeliveryError::from)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
