use std::sync::Arc;

use wardwatch_core::store::PatientStore;
use wardwatch_events::EventBus;
use wardwatch_worker::TriageMonitor;

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Patient storage (PostgreSQL or in-memory).
    pub store: Arc<dyn PatientStore>,
    /// Owns per-patient triage state; all vitals writes go through it.
    pub monitor: Arc<TriageMonitor>,
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (ward console clients).
    pub ws_manager: Arc<WsManager>,
    /// Event bus carrying triage changes and escalations.
    pub event_bus: Arc<EventBus>,
}
