use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{patients, triage};
use crate::state::AppState;

/// Patient routes mounted at `/patients`.
///
/// ```text
/// GET  /              -> list_patients
/// POST /              -> create_patient
/// GET  /{id}          -> get_patient
/// PUT  /{id}/vitals   -> update_vitals
/// GET  /{id}/triage   -> get_patient_triage
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(patients::list_patients).post(patients::create_patient),
        )
        .route("/{id}", get(patients::get_patient))
        .route("/{id}/vitals", put(patients::update_vitals))
        .route("/{id}/triage", get(triage::get_patient_triage))
}
