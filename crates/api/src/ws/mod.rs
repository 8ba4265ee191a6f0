//! WebSocket push of triage events to ward console clients.
//!
//! Provides connection management, heartbeat pings, the HTTP upgrade
//! handler, and the forwarder that relays event bus traffic to clients.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::forward_events;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
