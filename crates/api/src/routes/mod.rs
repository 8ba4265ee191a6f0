pub mod health;
pub mod patients;
pub mod triage;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /ws                              WebSocket stream of triage events
///
/// /patients                        list, register
/// /patients/{id}                   get
/// /patients/{id}/vitals            record vitals (PUT)
/// /patients/{id}/triage            evaluate without recording
///
/// /triage/thresholds               active threshold table
/// /triage/sweep                    run a sweep now (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/patients", patients::router())
        .nest("/triage", triage::router())
}
