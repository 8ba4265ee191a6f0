//! Per-patient tier state machine and escalation decision.
//!
//! Pure logic. The caller owns the [`PatientTriageState`], supplies `now`,
//! and performs any notification side effects based on the returned
//! [`TransitionOutcome`].

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::triage::{Tier, TriageAssessment};
use crate::types::Timestamp;
use crate::vitals::VitalSign;

/// Notification policy applied on each evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// Re-notify a patient who stays HIGH/CRITICAL once this much time has
    /// passed since the last alert. `None` notifies on transitions only.
    pub realert_after: Option<Duration>,
}

/// Recorded triage state for one patient.
///
/// A patient with no recorded state is treated as [`Tier::Low`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientTriageState {
    pub tier: Tier,
    pub abnormal_signals: BTreeSet<VitalSign>,
    pub last_triage_update: Option<Timestamp>,
    pub last_alerted_at: Option<Timestamp>,
}

impl PatientTriageState {
    /// Seed state from a previously persisted tier.
    pub fn recorded(
        tier: Tier,
        abnormal_signals: BTreeSet<VitalSign>,
        last_triage_update: Option<Timestamp>,
    ) -> Self {
        Self {
            tier,
            abnormal_signals,
            last_triage_update,
            last_alerted_at: None,
        }
    }
}

/// Why a notification should be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyReason {
    /// The tier changed into HIGH or CRITICAL.
    Transition,
    /// The tier stayed HIGH/CRITICAL past the re-alert cool-down.
    Realert,
}

/// What applying an assessment did to the patient's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionOutcome {
    pub previous_tier: Tier,
    pub current_tier: Tier,
    /// The tier differs from the previous one and state was updated.
    pub changed: bool,
    pub notify: Option<NotifyReason>,
}

impl TransitionOutcome {
    pub fn should_notify(&self) -> bool {
        self.notify.is_some()
    }
}

/// Apply a fresh assessment to a patient's state.
///
/// On a tier change the state's tier, abnormal signals, and update timestamp
/// are replaced; a change into HIGH or CRITICAL requests a notification.
/// An unchanged tier leaves the state untouched and only notifies when the
/// policy's re-alert cool-down has elapsed.
pub fn apply_assessment(
    state: &mut PatientTriageState,
    assessment: &TriageAssessment,
    now: Timestamp,
    policy: &EscalationPolicy,
) -> TransitionOutcome {
    let previous_tier = state.tier;
    let current_tier = assessment.tier;

    if current_tier != previous_tier {
        state.tier = current_tier;
        state.abnormal_signals = assessment.abnormal_signals.clone();
        state.last_triage_update = Some(now);

        let notify = current_tier
            .is_escalated()
            .then_some(NotifyReason::Transition);
        if notify.is_some() {
            state.last_alerted_at = Some(now);
        }

        return TransitionOutcome {
            previous_tier,
            current_tier,
            changed: true,
            notify,
        };
    }

    let notify = realert_due(state, now, policy).then_some(NotifyReason::Realert);
    if notify.is_some() {
        state.last_alerted_at = Some(now);
    }

    TransitionOutcome {
        previous_tier,
        current_tier,
        changed: false,
        notify,
    }
}

fn realert_due(state: &PatientTriageState, now: Timestamp, policy: &EscalationPolicy) -> bool {
    let Some(cooldown) = policy.realert_after else {
        return false;
    };
    if !state.tier.is_escalated() {
        return false;
    }
    let Ok(cooldown) = chrono::Duration::from_std(cooldown) else {
        return false;
    };
    match state.last_alerted_at {
        Some(last) => now.signed_duration_since(last) >= cooldown,
        // Escalated tier restored from storage without an alert on record.
        None => true,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn assessment(tier: Tier, signals: &[VitalSign]) -> TriageAssessment {
        TriageAssessment {
            tier,
            abnormal_signals: signals.iter().copied().collect(),
            score: signals.len() as u32,
        }
    }

    #[test]
    fn initial_state_is_low() {
        let state = PatientTriageState::default();
        assert_eq!(state.tier, Tier::Low);
        assert!(state.last_triage_update.is_none());
    }

    #[test]
    fn low_to_high_notifies_once() {
        let policy = EscalationPolicy::default();
        let mut state = PatientTriageState::default();
        let high = assessment(Tier::High, &[VitalSign::SystolicBp, VitalSign::DiastolicBp]);

        let first = apply_assessment(&mut state, &high, at(0), &policy);
        assert!(first.changed);
        assert_eq!(first.notify, Some(NotifyReason::Transition));
        assert_eq!(state.tier, Tier::High);
        assert_eq!(state.last_triage_update, Some(at(0)));
        assert_eq!(state.last_alerted_at, Some(at(0)));

        let second = apply_assessment(&mut state, &high, at(30), &policy);
        assert!(!second.changed);
        assert!(!second.should_notify());
        assert_eq!(state.last_triage_update, Some(at(0)));
    }

    #[test]
    fn change_to_medium_updates_without_notifying() {
        let policy = EscalationPolicy::default();
        let mut state = PatientTriageState::default();

        let outcome = apply_assessment(
            &mut state,
            &assessment(Tier::Medium, &[VitalSign::HeartRate]),
            at(0),
            &policy,
        );
        assert!(outcome.changed);
        assert!(!outcome.should_notify());
        assert_eq!(state.tier, Tier::Medium);
        assert!(state.last_alerted_at.is_none());
    }

    #[test]
    fn de_escalation_updates_without_notifying() {
        let policy = EscalationPolicy::default();
        let mut state =
            PatientTriageState::recorded(Tier::Critical, BTreeSet::new(), Some(at(0)));

        let outcome = apply_assessment(&mut state, &TriageAssessment::normal(), at(10), &policy);
        assert!(outcome.changed);
        assert_eq!(outcome.previous_tier, Tier::Critical);
        assert_eq!(outcome.current_tier, Tier::Low);
        assert!(!outcome.should_notify());
        assert!(state.abnormal_signals.is_empty());
    }

    #[test]
    fn high_to_critical_notifies_again() {
        let policy = EscalationPolicy::default();
        let mut state = PatientTriageState::default();

        apply_assessment(
            &mut state,
            &assessment(Tier::High, &[VitalSign::HeartRate, VitalSign::Temperature]),
            at(0),
            &policy,
        );
        let outcome = apply_assessment(
            &mut state,
            &assessment(
                Tier::Critical,
                &[VitalSign::HeartRate, VitalSign::Temperature, VitalSign::RespiratoryRate],
            ),
            at(5),
            &policy,
        );
        assert_eq!(outcome.notify, Some(NotifyReason::Transition));
    }

    #[test]
    fn realert_fires_after_cooldown_only() {
        let policy = EscalationPolicy {
            realert_after: Some(Duration::from_secs(600)),
        };
        let mut state = PatientTriageState::default();
        let critical = assessment(
            Tier::Critical,
            &[VitalSign::HeartRate, VitalSign::SystolicBp, VitalSign::Temperature],
        );

        assert!(apply_assessment(&mut state, &critical, at(0), &policy).should_notify());
        assert!(!apply_assessment(&mut state, &critical, at(300), &policy).should_notify());

        let later = apply_assessment(&mut state, &critical, at(600), &policy);
        assert_eq!(later.notify, Some(NotifyReason::Realert));
        assert!(!later.changed);
        assert_eq!(state.last_alerted_at, Some(at(600)));

        assert!(!apply_assessment(&mut state, &critical, at(900), &policy).should_notify());
    }

    #[test]
    fn realert_never_fires_for_non_escalated_tiers() {
        let policy = EscalationPolicy {
            realert_after: Some(Duration::from_secs(1)),
        };
        let mut state = PatientTriageState::default();
        let medium = assessment(Tier::Medium, &[VitalSign::HeartRate]);

        apply_assessment(&mut state, &medium, at(0), &policy);
        assert!(!apply_assessment(&mut state, &medium, at(100), &policy).should_notify());
    }

    #[test]
    fn restored_escalated_state_realerts_when_enabled() {
        let policy = EscalationPolicy {
            realert_after: Some(Duration::from_secs(60)),
        };
        let mut state = PatientTriageState::recorded(Tier::High, BTreeSet::new(), Some(at(0)));
        let high = assessment(Tier::High, &[VitalSign::SystolicBp, VitalSign::DiastolicBp]);

        let outcome = apply_assessment(&mut state, &high, at(1), &policy);
        assert_eq!(outcome.notify, Some(NotifyReason::Realert));
    }
}
