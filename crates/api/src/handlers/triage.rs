//! Handlers for triage inspection and on-demand sweeps.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use wardwatch_core::types::DbId;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/patients/{id}/triage
///
/// Evaluate the patient's stored vitals without recording a transition.
pub async fn get_patient_triage(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let preview = state.monitor.assess(id).await?;
    Ok(Json(DataResponse { data: preview }))
}

/// GET /api/v1/triage/thresholds
pub async fn get_thresholds(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.monitor.thresholds().clone(),
    }))
}

/// POST /api/v1/triage/sweep
pub async fn run_sweep(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summary = state.monitor.sweep().await?;
    tracing::info!(
        evaluated = summary.evaluated,
        changed = summary.changed,
        "Manual triage sweep completed"
    );
    Ok(Json(DataResponse { data: summary }))
}
