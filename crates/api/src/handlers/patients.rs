//! Handlers for patient registration and vitals entry.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use wardwatch_core::error::CoreError;
use wardwatch_core::store::NewPatient;
use wardwatch_core::types::{DbId, Timestamp};
use wardwatch_core::vitals::VitalReading;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /patients`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePatientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 100))]
    pub ward: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub assigned_caregiver: Option<String>,
}

/// Body of `PUT /patients/{id}/vitals`.
///
/// Omitted signals are recorded as not measured. `observed_at` defaults to
/// the time the request is handled.
#[derive(Debug, Deserialize)]
pub struct UpdateVitalsRequest {
    pub heart_rate: Option<i32>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub respiratory_rate: Option<i32>,
    pub oxygen_saturation: Option<i32>,
    pub temperature: Option<f64>,
    pub observed_at: Option<Timestamp>,
}

impl UpdateVitalsRequest {
    fn into_reading(self, now: Timestamp) -> VitalReading {
        VitalReading {
            heart_rate: self.heart_rate,
            systolic_bp: self.systolic_bp,
            diastolic_bp: self.diastolic_bp,
            respiratory_rate: self.respiratory_rate,
            oxygen_saturation: self.oxygen_saturation,
            temperature: self.temperature,
            observed_at: self.observed_at.unwrap_or(now),
        }
    }
}

/// POST /api/v1/patients
pub async fn create_patient(
    State(state): State<AppState>,
    Json(input): Json<CreatePatientRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let name = input.name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("name must not be blank".to_string()).into());
    }

    let patient = state
        .store
        .create_patient(&NewPatient {
            name: name.to_string(),
            ward: input.ward,
            assigned_caregiver: input.assigned_caregiver,
        })
        .await?;

    tracing::info!(patient_id = patient.id, ward = ?patient.ward, "Patient registered");

    Ok((StatusCode::CREATED, Json(DataResponse { data: patient })))
}

/// GET /api/v1/patients
pub async fn list_patients(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let patients = state.store.list_patients().await?;
    Ok(Json(DataResponse { data: patients }))
}

/// GET /api/v1/patients/{id}
pub async fn get_patient(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let patient = state
        .store
        .get_patient(id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "patient",
            id,
        })?;
    Ok(Json(DataResponse { data: patient }))
}

/// PUT /api/v1/patients/{id}/vitals
///
/// Replaces the patient's latest reading and evaluates it immediately.
/// The response carries the assessment and whether the tier changed or an
/// escalation was raised.
pub async fn update_vitals(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateVitalsRequest>,
) -> AppResult<impl IntoResponse> {
    let reading = input.into_reading(chrono::Utc::now());
    let outcome = state.monitor.record_vitals(id, reading).await?;

    tracing::debug!(
        patient_id = id,
        tier = %outcome.assessment.tier,
        changed = outcome.transition.changed,
        "Vitals recorded"
    );

    Ok(Json(DataResponse { data: outcome }))
}
