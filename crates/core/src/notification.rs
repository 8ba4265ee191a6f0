//! Escalation notification payload.
//!
//! Built from a patient and a tier transition; delivered by the sinks in the
//! events crate. Constructing a notification has no side effects.

use serde::{Deserialize, Serialize};

use crate::roles::{ROLE_DOCTOR, ROLE_NURSE};
use crate::triage::{Tier, TriageAssessment};
use crate::types::{DbId, Timestamp};

/// `metadata.type` value for triage escalations.
pub const NOTIFICATION_TYPE_TRIAGE_ESCALATION: &str = "triage_escalation";

/// Routing metadata attached to every notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    #[serde(rename = "type")]
    pub notification_type: String,
    pub role: String,
}

/// A notification raised when a patient escalates to HIGH or CRITICAL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationNotification {
    pub recipient: String,
    pub title: String,
    pub body: String,
    pub metadata: NotificationMetadata,
    pub patient_id: DbId,
    pub patient_name: String,
    pub tier: Tier,
    /// Display names of the abnormal signals.
    pub abnormal_signals: Vec<String>,
    pub created_at: Timestamp,
}

impl EscalationNotification {
    /// Build the notification for a patient entering `assessment.tier`.
    pub fn for_escalation(
        patient_id: DbId,
        patient_name: &str,
        recipient: &str,
        assessment: &TriageAssessment,
        created_at: Timestamp,
    ) -> Self {
        let tier = assessment.tier;
        let abnormal_signals: Vec<String> = assessment
            .abnormal_signal_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let title = match tier {
            Tier::Critical => format!("CRITICAL ALERT: {patient_name}"),
            _ => format!("High Priority Warning: {patient_name}"),
        };

        let signals_text = if abnormal_signals.is_empty() {
            "none recorded".to_string()
        } else {
            abnormal_signals.join(", ")
        };
        let body = format!(
            "{patient_name} has been triaged as {tier}. Abnormal signals: {signals_text}."
        );

        let role = match tier {
            Tier::Critical => ROLE_DOCTOR,
            _ => ROLE_NURSE,
        };

        Self {
            recipient: recipient.to_string(),
            title,
            body,
            metadata: NotificationMetadata {
                notification_type: NOTIFICATION_TYPE_TRIAGE_ESCALATION.to_string(),
                role: role.to_string(),
            },
            patient_id,
            patient_name: patient_name.to_string(),
            tier,
            abnormal_signals,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vitals::VitalSign;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn assessment(tier: Tier, signals: &[VitalSign]) -> TriageAssessment {
        TriageAssessment {
            tier,
            abnormal_signals: signals.iter().copied().collect::<BTreeSet<_>>(),
            score: 4,
        }
    }

    #[test]
    fn critical_notification_uses_alert_framing() {
        let n = EscalationNotification::for_escalation(
            7,
            "Jane Roe",
            "dr.smith",
            &assessment(
                Tier::Critical,
                &[VitalSign::OxygenSaturation, VitalSign::HeartRate, VitalSign::Temperature],
            ),
            Utc::now(),
        );

        assert_eq!(n.title, "CRITICAL ALERT: Jane Roe");
        assert_eq!(n.recipient, "dr.smith");
        assert_eq!(n.metadata.role, ROLE_DOCTOR);
        assert_eq!(n.metadata.notification_type, NOTIFICATION_TYPE_TRIAGE_ESCALATION);
        assert_eq!(
            n.abnormal_signals,
            vec!["Heart Rate", "Oxygen Saturation", "Temperature"]
        );
        assert!(n.body.contains("CRITICAL"));
        assert!(n.body.contains("Heart Rate, Oxygen Saturation, Temperature"));
    }

    #[test]
    fn high_notification_uses_warning_framing() {
        let n = EscalationNotification::for_escalation(
            3,
            "John Doe",
            "ward-4",
            &assessment(Tier::High, &[VitalSign::SystolicBp, VitalSign::DiastolicBp]),
            Utc::now(),
        );

        assert_eq!(n.title, "High Priority Warning: John Doe");
        assert_eq!(n.metadata.role, ROLE_NURSE);
        assert_eq!(n.tier, Tier::High);
    }

    #[test]
    fn metadata_serializes_type_key() {
        let n = EscalationNotification::for_escalation(
            1,
            "A",
            "b",
            &assessment(Tier::High, &[VitalSign::HeartRate, VitalSign::Temperature]),
            Utc::now(),
        );
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["metadata"]["type"], "triage_escalation");
        assert_eq!(json["tier"], "HIGH");
    }
}
