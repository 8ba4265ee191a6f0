//! Patient store abstraction.
//!
//! The triage monitor reads the latest vitals per patient and writes back the
//! computed tier through [`PatientStore`]. The PostgreSQL implementation lives
//! in the db crate; [`InMemoryPatientStore`] backs tests and database-less
//! development runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::escalation::PatientTriageState;
use crate::triage::Tier;
use crate::types::{DbId, Timestamp};
use crate::vitals::{VitalReading, VitalSign};

/// A patient as seen by the triage subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: DbId,
    pub name: String,
    pub ward: Option<String>,
    /// Caregiver to notify on escalation; falls back to the ward recipient.
    pub assigned_caregiver: Option<String>,
    /// Latest reading. Superseded, never merged, by each new save.
    pub vitals: Option<VitalReading>,
    pub vitals_updated_at: Option<Timestamp>,
    /// Last recorded tier; `None` before the first evaluation.
    pub triage_tier: Option<Tier>,
    pub abnormal_signals: BTreeSet<VitalSign>,
    pub last_triage_update: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Patient {
    /// The recorded triage state, treating "never evaluated" as LOW.
    pub fn triage_state(&self) -> PatientTriageState {
        PatientTriageState::recorded(
            self.triage_tier.unwrap_or_default(),
            self.abnormal_signals.clone(),
            self.last_triage_update,
        )
    }

    /// Whether the periodic sweep should re-evaluate this patient.
    pub fn is_monitored(&self) -> bool {
        self.vitals.is_some() && self.vitals_updated_at.is_some()
    }
}

/// Input for registering a patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default)]
    pub assigned_caregiver: Option<String>,
}

/// Upsert payload written after each tier change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageUpdate {
    pub tier: Tier,
    pub abnormal_signals: BTreeSet<VitalSign>,
    pub last_triage_update: Timestamp,
}

/// Storage for patients, their latest vitals, and their recorded tier.
#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn create_patient(&self, input: &NewPatient) -> Result<Patient, CoreError>;

    async fn get_patient(&self, id: DbId) -> Result<Option<Patient>, CoreError>;

    async fn list_patients(&self) -> Result<Vec<Patient>, CoreError>;

    /// Patients whose vitals carry an updated-at timestamp.
    async fn list_monitored(&self) -> Result<Vec<Patient>, CoreError>;

    /// Replace the patient's latest reading.
    async fn save_vitals(
        &self,
        id: DbId,
        reading: &VitalReading,
        updated_at: Timestamp,
    ) -> Result<(), CoreError>;

    /// Upsert the patient's tier, abnormal signals and update timestamp.
    async fn write_triage(&self, id: DbId, update: &TriageUpdate) -> Result<(), CoreError>;

    async fn health_check(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryPatientStore
// ---------------------------------------------------------------------------

/// Process-local store keyed by patient id.
#[derive(Debug)]
pub struct InMemoryPatientStore {
    patients: RwLock<HashMap<DbId, Patient>>,
    next_id: AtomicI64,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self {
            patients: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryPatientStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "patient",
        id,
    }
}

#[async_trait]
impl PatientStore for InMemoryPatientStore {
    async fn create_patient(&self, input: &NewPatient) -> Result<Patient, CoreError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let patient = Patient {
            id,
            name: input.name.clone(),
            ward: input.ward.clone(),
            assigned_caregiver: input.assigned_caregiver.clone(),
            vitals: None,
            vitals_updated_at: None,
            triage_tier: None,
            abnormal_signals: BTreeSet::new(),
            last_triage_update: None,
            created_at: Utc::now(),
        };
        self.patients.write().await.insert(id, patient.clone());
        Ok(patient)
    }

    async fn get_patient(&self, id: DbId) -> Result<Option<Patient>, CoreError> {
        Ok(self.patients.read().await.get(&id).cloned())
    }

    async fn list_patients(&self) -> Result<Vec<Patient>, CoreError> {
        let mut patients: Vec<Patient> = self.patients.read().await.values().cloned().collect();
        patients.sort_by_key(|p| p.id);
        Ok(patients)
    }

    async fn list_monitored(&self) -> Result<Vec<Patient>, CoreError> {
        let mut patients: Vec<Patient> = self
            .patients
            .read()
            .await
            .values()
            .filter(|p| p.is_monitored())
            .cloned()
            .collect();
        patients.sort_by_key(|p| p.id);
        Ok(patients)
    }

    async fn save_vitals(
        &self,
        id: DbId,
        reading: &VitalReading,
        updated_at: Timestamp,
    ) -> Result<(), CoreError> {
        let mut patients = self.patients.write().await;
        let patient = patients.get_mut(&id).ok_or_else(|| not_found(id))?;
        patient.vitals = Some(reading.clone());
        patient.vitals_updated_at = Some(updated_at);
        Ok(())
    }

    async fn write_triage(&self, id: DbId, update: &TriageUpdate) -> Result<(), CoreError> {
        let mut patients = self.patients.write().await;
        let patient = patients.get_mut(&id).ok_or_else(|| not_found(id))?;
        patient.triage_tier = Some(update.tier);
        patient.abnormal_signals = update.abnormal_signals.clone();
        patient.last_triage_update = Some(update.last_triage_update);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.to_string(),
            ward: Some("4B".to_string()),
            assigned_caregiver: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let store = InMemoryPatientStore::new();
        let a = store.create_patient(&new_patient("A")).await.unwrap();
        let b = store.create_patient(&new_patient("B")).await.unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(a.triage_tier.is_none());
        assert_eq!(a.triage_state().tier, Tier::Low);
    }

    #[tokio::test]
    async fn only_patients_with_vitals_are_monitored() {
        let store = InMemoryPatientStore::new();
        let a = store.create_patient(&new_patient("A")).await.unwrap();
        store.create_patient(&new_patient("B")).await.unwrap();

        let now = Utc::now();
        store
            .save_vitals(a.id, &VitalReading::empty(now), now)
            .await
            .unwrap();

        let monitored = store.list_monitored().await.unwrap();
        assert_eq!(monitored.len(), 1);
        assert_eq!(monitored[0].id, a.id);
        assert_eq!(store.list_patients().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn write_triage_upserts_state() {
        let store = InMemoryPatientStore::new();
        let a = store.create_patient(&new_patient("A")).await.unwrap();
        let now = Utc::now();

        let update = TriageUpdate {
            tier: Tier::High,
            abnormal_signals: BTreeSet::from([VitalSign::HeartRate, VitalSign::Temperature]),
            last_triage_update: now,
        };
        store.write_triage(a.id, &update).await.unwrap();

        let stored = store.get_patient(a.id).await.unwrap().unwrap();
        assert_eq!(stored.triage_tier, Some(Tier::High));
        assert_eq!(stored.abnormal_signals, update.abnormal_signals);
        assert_eq!(stored.last_triage_update, Some(now));
    }

    #[tokio::test]
    async fn writes_to_unknown_patient_are_not_found() {
        let store = InMemoryPatientStore::new();
        let now = Utc::now();
        let err = store
            .save_vitals(99, &VitalReading::empty(now), now)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { id: 99, .. }));
        assert!(store.get_patient(99).await.unwrap().is_none());
    }
}
