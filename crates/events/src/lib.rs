//! Ward event bus and escalation notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`WardEvent`]: the event envelope carried on the bus.
//! - [`delivery`]: notification channels (in-app, webhook, email) behind
//!   the [`NotificationSink`] trait.
//! - [`NotificationDispatcher`]: fire-and-forget fan-out to every sink.

pub mod bus;
pub mod delivery;
pub mod dispatch;

pub use bus::{EventBus, WardEvent, EVENT_TRIAGE_CHANGED, EVENT_TRIAGE_ESCALATED};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::in_app::InAppDelivery;
pub use delivery::webhook::WebhookDelivery;
pub use delivery::{DeliveryError, NotificationSink};
pub use dispatch::{DeliveryReport, NotificationDispatcher};
