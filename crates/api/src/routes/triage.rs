use axum::routing::{get, post};
use axum::Router;

use crate::handlers::triage;
use crate::state::AppState;

/// Triage routes mounted at `/triage`.
///
/// ```text
/// GET  /thresholds -> get_thresholds
/// POST /sweep      -> run_sweep
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/thresholds", get(triage::get_thresholds))
        .route("/sweep", post(triage::run_sweep))
}
