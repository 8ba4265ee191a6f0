//! [`PatientStore`] backed by PostgreSQL.

use async_trait::async_trait;
use wardwatch_core::error::CoreError;
use wardwatch_core::store::{NewPatient, Patient, PatientStore, TriageUpdate};
use wardwatch_core::types::{DbId, Timestamp};
use wardwatch_core::vitals::VitalReading;

use crate::models::patient::PatientRow;
use crate::repositories::PatientRepo;
use crate::DbPool;

/// Adapts [`PatientRepo`] to the store trait used by the triage monitor.
#[derive(Clone)]
pub struct PgPatientStore {
    pool: DbPool,
}

impl PgPatientStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn db_error(e: sqlx::Error) -> CoreError {
    tracing::error!(error = %e, "Patient store query failed");
    CoreError::Internal(format!("database error: {e}"))
}

fn convert_all(rows: Vec<PatientRow>) -> Result<Vec<Patient>, CoreError> {
    rows.into_iter().map(Patient::try_from).collect()
}

fn ensure_updated(rows: u64, id: DbId) -> Result<(), CoreError> {
    if rows == 0 {
        return Err(CoreError::NotFound {
            entity: "patient",
            id,
        });
    }
    Ok(())
}

#[async_trait]
impl PatientStore for PgPatientStore {
    async fn create_patient(&self, input: &NewPatient) -> Result<Patient, CoreError> {
        let row = PatientRepo::create(&self.pool, input)
            .await
            .map_err(db_error)?;
        Patient::try_from(row)
    }

    async fn get_patient(&self, id: DbId) -> Result<Option<Patient>, CoreError> {
        PatientRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db_error)?
            .map(Patient::try_from)
            .transpose()
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, CoreError> {
        convert_all(PatientRepo::list(&self.pool).await.map_err(db_error)?)
    }

    async fn list_monitored(&self) -> Result<Vec<Patient>, CoreError> {
        convert_all(
            PatientRepo::list_with_vitals(&self.pool)
                .await
                .map_err(db_error)?,
        )
    }

    async fn save_vitals(
        &self,
        id: DbId,
        reading: &VitalReading,
        updated_at: Timestamp,
    ) -> Result<(), CoreError> {
        let rows = PatientRepo::update_vitals(&self.pool, id, reading, updated_at)
            .await
            .map_err(db_error)?;
        ensure_updated(rows, id)
    }

    async fn write_triage(&self, id: DbId, update: &TriageUpdate) -> Result<(), CoreError> {
        let rows = PatientRepo::update_triage(&self.pool, id, update)
            .await
            .map_err(db_error)?;
        ensure_updated(rows, id)
    }

    async fn health_check(&self) -> Result<(), CoreError> {
        crate::health_check(&self.pool).await.map_err(db_error)
    }
}
