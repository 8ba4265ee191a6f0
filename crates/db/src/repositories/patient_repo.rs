//! Repository for the `patients` table.

use sqlx::types::Json;
use sqlx::PgPool;
use wardwatch_core::store::{NewPatient, TriageUpdate};
use wardwatch_core::types::{DbId, Timestamp};
use wardwatch_core::vitals::VitalReading;

use crate::models::patient::PatientRow;

/// Column list for `patients` queries.
const COLUMNS: &str = "\
    id, name, ward, assigned_caregiver, \
    heart_rate, systolic_bp, diastolic_bp, respiratory_rate, oxygen_saturation, temperature, \
    observed_at, vitals_updated_at, \
    triage_tier, abnormal_signals, last_triage_update, created_at";

/// Provides query operations for patients.
pub struct PatientRepo;

impl PatientRepo {
    /// Insert a patient with no vitals and no recorded tier.
    pub async fn create(pool: &PgPool, input: &NewPatient) -> Result<PatientRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO patients (name, ward, assigned_caregiver) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(&input.name)
            .bind(&input.ward)
            .bind(&input.assigned_caregiver)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PatientRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients WHERE id = $1");
        sqlx::query_as::<_, PatientRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<PatientRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM patients ORDER BY id");
        sqlx::query_as::<_, PatientRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Patients whose vitals carry an updated-at timestamp (sweep candidates).
    pub async fn list_with_vitals(pool: &PgPool) -> Result<Vec<PatientRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM patients \
             WHERE vitals_updated_at IS NOT NULL AND observed_at IS NOT NULL \
             ORDER BY id"
        );
        sqlx::query_as::<_, PatientRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Replace the latest reading. Returns the number of rows updated.
    pub async fn update_vitals(
        pool: &PgPool,
        id: DbId,
        reading: &VitalReading,
        updated_at: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE patients SET \
                heart_rate = $2, systolic_bp = $3, diastolic_bp = $4, \
                respiratory_rate = $5, oxygen_saturation = $6, temperature = $7, \
                observed_at = $8, vitals_updated_at = $9, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(reading.heart_rate)
        .bind(reading.systolic_bp)
        .bind(reading.diastolic_bp)
        .bind(reading.respiratory_rate)
        .bind(reading.oxygen_saturation)
        .bind(reading.temperature)
        .bind(reading.observed_at)
        .bind(updated_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Upsert the recorded triage state. Returns the number of rows updated.
    pub async fn update_triage(
        pool: &PgPool,
        id: DbId,
        update: &TriageUpdate,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE patients SET \
                triage_tier = $2, abnormal_signals = $3, last_triage_update = $4, \
                updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.tier.as_str())
        .bind(Json(update.abnormal_signals.clone()))
        .bind(update.last_triage_update)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
