//! Triage monitor: the stateful half of the triage subsystem.
//!
//! [`TriageMonitor`] owns the per-patient tier state and drives both
//! evaluation triggers:
//!
//! - on edit, [`TriageMonitor::record_vitals`] saves a reading and evaluates it;
//! - on a timer, [`TriageMonitor::sweep`] re-evaluates every patient whose
//!   vitals carry an updated-at timestamp.
//!
//! Both paths hold the patient's async mutex for the whole
//! read-evaluate-write step. Escalation notifications are handed to the
//! [`NotificationDispatcher`] on a spawned task and never affect the
//! recorded tier.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use wardwatch_core::clock::{Clock, SystemClock};
use wardwatch_core::error::CoreError;
use wardwatch_core::escalation::{
    apply_assessment, EscalationPolicy, PatientTriageState, TransitionOutcome,
};
use wardwatch_core::notification::EscalationNotification;
use wardwatch_core::store::{Patient, PatientStore, TriageUpdate};
use wardwatch_core::thresholds::ThresholdTable;
use wardwatch_core::triage::{evaluate_vitals, Tier, TriageAssessment};
use wardwatch_core::types::{DbId, Timestamp};
use wardwatch_core::vitals::VitalReading;
use wardwatch_events::{
    DeliveryReport, EventBus, NotificationDispatcher, WardEvent, EVENT_TRIAGE_CHANGED,
};

use crate::config::TriageConfig;

type PatientSlot = Arc<Mutex<Option<PatientTriageState>>>;

/// Result of evaluating one patient.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutcome {
    pub patient_id: DbId,
    pub assessment: TriageAssessment,
    pub transition: TransitionOutcome,
    /// How many of the six signals the reading carried. Zero means the LOW
    /// tier reflects missing data rather than normal values.
    pub measured_signals: usize,
}

/// Read-only evaluation of a patient's current vitals.
#[derive(Debug, Clone, Serialize)]
pub struct TriagePreview {
    pub patient_id: DbId,
    pub recorded_tier: Option<Tier>,
    pub assessment: TriageAssessment,
    pub measured_signals: usize,
}

/// Totals for one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub started_at: Option<Timestamp>,
    pub evaluated: usize,
    pub changed: usize,
    pub notified: usize,
    pub failed: usize,
}

pub struct TriageMonitor {
    store: Arc<dyn PatientStore>,
    thresholds: Arc<ThresholdTable>,
    policy: EscalationPolicy,
    dispatcher: NotificationDispatcher,
    bus: Option<Arc<EventBus>>,
    clock: Arc<dyn Clock>,
    ward_recipient: String,
    states: RwLock<HashMap<DbId, PatientSlot>>,
    /// Serializes whole sweeps; a manual sweep waits for a scheduled one.
    sweep_lock: Mutex<()>,
    /// Outstanding notification deliveries, awaited by
    /// [`drain_notifications`](Self::drain_notifications).
    pending: std::sync::Mutex<Vec<JoinHandle<DeliveryReport>>>,
}

impl TriageMonitor {
    /// A monitor with default policy, no sinks, no event bus and the system clock.
    pub fn new(store: Arc<dyn PatientStore>, thresholds: ThresholdTable) -> Self {
        Self {
            store,
            thresholds: Arc::new(thresholds),
            policy: EscalationPolicy::default(),
            dispatcher: NotificationDispatcher::new(),
            bus: None,
            clock: Arc::new(SystemClock),
            ward_recipient: TriageConfig::default().ward_recipient,
            states: RwLock::new(HashMap::new()),
            sweep_lock: Mutex::new(()),
            pending: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Build from loaded configuration.
    pub fn from_config(
        store: Arc<dyn PatientStore>,
        config: &TriageConfig,
        dispatcher: NotificationDispatcher,
    ) -> Result<Self, CoreError> {
        Ok(Self::new(store, config.thresholds()?)
            .with_policy(config.policy())
            .with_ward_recipient(config.ward_recipient.clone())
            .with_dispatcher(dispatcher))
    }

    pub fn with_policy(mut self, policy: EscalationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: NotificationDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Publish `triage.changed` events on this bus.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ward_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.ward_recipient = recipient.into();
        self
    }

    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    pub fn policy(&self) -> EscalationPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<dyn PatientStore> {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Triggers
    // -----------------------------------------------------------------------

    /// Save a new reading for a patient and evaluate it.
    ///
    /// The reading replaces the previous one. Rejects impossible values with
    /// [`CoreError::Validation`] before anything is written.
    pub async fn record_vitals(
        &self,
        patient_id: DbId,
        reading: VitalReading,
    ) -> Result<EvaluationOutcome, CoreError> {
        reading.validate()?;

        let slot = self.slot(patient_id).await;
        let mut state = slot.lock().await;

        let mut patient = self
            .store
            .get_patient(patient_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "patient",
                id: patient_id,
            })?;

        let now = self.clock.now();
        self.store.save_vitals(patient_id, &reading, now).await?;
        patient.vitals = Some(reading);
        patient.vitals_updated_at = Some(now);

        self.evaluate_locked(&patient, &mut state, now).await
    }

    /// Re-evaluate every monitored patient.
    ///
    /// A failure on one patient is logged and counted; the sweep moves on to
    /// the next. Only a failure to list patients aborts the pass.
    pub async fn sweep(&self) -> Result<SweepSummary, CoreError> {
        let _guard = self.sweep_lock.lock().await;
        let started_at = self.clock.now();
        let mut summary = SweepSummary {
            started_at: Some(started_at),
            ..Default::default()
        };

        let candidates = self.store.list_monitored().await?;

        for candidate in candidates {
            match self.sweep_one(candidate.id).await {
                Ok(Some(outcome)) => {
                    summary.evaluated += 1;
                    if outcome.transition.changed {
                        summary.changed += 1;
                    }
                    if outcome.transition.should_notify() {
                        summary.notified += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        patient_id = candidate.id,
                        error = %e,
                        "Triage sweep: patient evaluation failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        tracing::debug!(
            evaluated = summary.evaluated,
            changed = summary.changed,
            notified = summary.notified,
            failed = summary.failed,
            "Triage sweep complete"
        );
        Ok(summary)
    }

    /// Evaluate a patient's stored vitals without recording anything.
    pub async fn assess(&self, patient_id: DbId) -> Result<TriagePreview, CoreError> {
        let patient = self
            .store
            .get_patient(patient_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "patient",
                id: patient_id,
            })?;

        let (assessment, measured_signals) = match &patient.vitals {
            Some(reading) => (
                evaluate_vitals(reading, &self.thresholds),
                reading.measured_count(),
            ),
            None => (TriageAssessment::normal(), 0),
        };

        Ok(TriagePreview {
            patient_id,
            recorded_tier: patient.triage_tier,
            assessment,
            measured_signals,
        })
    }

    /// Await every notification dispatched so far.
    pub async fn drain_notifications(&self) -> Vec<DeliveryReport> {
        let handles = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!(error = %e, "Notification task failed"),
            }
        }
        reports
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn slot(&self, patient_id: DbId) -> PatientSlot {
        if let Some(slot) = self.states.read().await.get(&patient_id) {
            return Arc::clone(slot);
        }
        let mut states = self.states.write().await;
        Arc::clone(states.entry(patient_id).or_default())
    }

    async fn sweep_one(&self, patient_id: DbId) -> Result<Option<EvaluationOutcome>, CoreError> {
        let slot = self.slot(patient_id).await;
        let mut state = slot.lock().await;

        // Re-read under the lock so a concurrent edit is never overwritten.
        let Some(patient) = self.store.get_patient(patient_id).await? else {
            return Ok(None);
        };
        if !patient.is_monitored() {
            return Ok(None);
        }

        let now = self.clock.now();
        self.evaluate_locked(&patient, &mut state, now).await.map(Some)
    }

    /// Evaluate, persist and notify. The caller holds the patient's lock.
    async fn evaluate_locked(
        &self,
        patient: &Patient,
        slot: &mut Option<PatientTriageState>,
        now: Timestamp,
    ) -> Result<EvaluationOutcome, CoreError> {
        let (assessment, measured_signals) = match &patient.vitals {
            Some(reading) => (
                evaluate_vitals(reading, &self.thresholds),
                reading.measured_count(),
            ),
            None => (TriageAssessment::normal(), 0),
        };

        let mut next = current_state(patient, slot.as_ref());
        let transition = apply_assessment(&mut next, &assessment, now, &self.policy);

        if transition.changed {
            let update = TriageUpdate {
                tier: next.tier,
                abnormal_signals: next.abnormal_signals.clone(),
                last_triage_update: now,
            };
            self.store.write_triage(patient.id, &update).await?;

            tracing::info!(
                patient_id = patient.id,
                previous = %transition.previous_tier,
                tier = %transition.current_tier,
                score = assessment.score,
                "Triage tier changed"
            );
            self.publish_change(patient.id, &transition, &assessment, now);
        }
        *slot = Some(next);

        if transition.should_notify() {
            self.notify(patient, &assessment, now);
        }

        Ok(EvaluationOutcome {
            patient_id: patient.id,
            assessment,
            transition,
            measured_signals,
        })
    }

    fn publish_change(
        &self,
        patient_id: DbId,
        transition: &TransitionOutcome,
        assessment: &TriageAssessment,
        now: Timestamp,
    ) {
        let Some(bus) = &self.bus else {
            return;
        };
        let event = WardEvent::new(EVENT_TRIAGE_CHANGED)
            .with_patient(patient_id)
            .with_payload(serde_json::json!({
                "previous_tier": transition.previous_tier,
                "tier": transition.current_tier,
                "abnormal_signals": assessment.abnormal_signals,
                "score": assessment.score,
            }))
            .at(now);
        bus.publish(event);
    }

    fn notify(&self, patient: &Patient, assessment: &TriageAssessment, now: Timestamp) {
        let recipient = patient
            .assigned_caregiver
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.ward_recipient);

        let notification = EscalationNotification::for_escalation(
            patient.id,
            &patient.name,
            recipient,
            assessment,
            now,
        );

        if self.dispatcher.is_empty() {
            tracing::warn!(
                patient_id = patient.id,
                tier = %assessment.tier,
                "Escalation raised but no notification channel is configured"
            );
        }

        let handle = self.dispatcher.dispatch(notification);
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }
}

/// The state to evaluate against. The tier, abnormal signals and last
/// update come from the store, which other monitors sharing it may have
/// written. The cached alert time is kept only while it belongs to the same
/// recorded transition. Otherwise an escalated tier counts as alerted when
/// it was recorded.
fn current_state(patient: &Patient, cached: Option<&PatientTriageState>) -> PatientTriageState {
    let mut state = patient.triage_state();
    state.last_alerted_at = match cached {
        Some(c) if c.tier == state.tier && c.last_triage_update == state.last_triage_update => {
            c.last_alerted_at
        }
        _ if state.tier.is_escalated() => state.last_triage_update,
        _ => None,
    };
    state
}
