//! Well-known notification channel name constants.
//!
//! Used by the notification sinks and recorded in delivery logs.

/// In-app notification pushed to connected ward consoles.
pub const CHANNEL_IN_APP: &str = "in_app";

/// Webhook notification delivered to an external HTTP endpoint.
pub const CHANNEL_WEBHOOK: &str = "webhook";

/// Email notification delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";
