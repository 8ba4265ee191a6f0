//! Patient row model.

use std::collections::BTreeSet;

use sqlx::types::Json;
use sqlx::FromRow;
use wardwatch_core::error::CoreError;
use wardwatch_core::store::Patient;
use wardwatch_core::triage::Tier;
use wardwatch_core::types::{DbId, Timestamp};
use wardwatch_core::vitals::{VitalReading, VitalSign};

/// A row of the `patients` table.
#[derive(Debug, Clone, FromRow)]
pub struct PatientRow {
    pub id: DbId,
    pub name: String,
    pub ward: Option<String>,
    pub assigned_caregiver: Option<String>,
    pub heart_rate: Option<i32>,
    pub systolic_bp: Option<i32>,
    pub diastolic_bp: Option<i32>,
    pub respiratory_rate: Option<i32>,
    pub oxygen_saturation: Option<i32>,
    pub temperature: Option<f64>,
    pub observed_at: Option<Timestamp>,
    pub vitals_updated_at: Option<Timestamp>,
    pub triage_tier: Option<String>,
    pub abnormal_signals: Json<BTreeSet<VitalSign>>,
    pub last_triage_update: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl TryFrom<PatientRow> for Patient {
    type Error = CoreError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let triage_tier = match row.triage_tier.as_deref() {
            None => None,
            Some(s) => Some(s.parse::<Tier>().map_err(|_| {
                CoreError::Internal(format!("patient {} has unknown triage tier '{s}'", row.id))
            })?),
        };

        // A reading exists once it has been observed at some point in time.
        let vitals = row.observed_at.map(|observed_at| VitalReading {
            heart_rate: row.heart_rate,
            systolic_bp: row.systolic_bp,
            diastolic_bp: row.diastolic_bp,
            respiratory_rate: row.respiratory_rate,
            oxygen_saturation: row.oxygen_saturation,
            temperature: row.temperature,
            observed_at,
        });

        Ok(Patient {
            id: row.id,
            name: row.name,
            ward: row.ward,
            assigned_caregiver: row.assigned_caregiver,
            vitals,
            vitals_updated_at: row.vitals_updated_at,
            triage_tier,
            abnormal_signals: row.abnormal_signals.0,
            last_triage_update: row.last_triage_update,
            created_at: row.created_at,
        })
    }
}
