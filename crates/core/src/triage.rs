//! Vitals-to-triage evaluation.
//!
//! Pure logic: [`evaluate_vitals`] maps a [`VitalReading`] and a
//! [`ThresholdTable`] to a [`TriageAssessment`]. No I/O, no clock, no state.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::thresholds::ThresholdTable;
use crate::vitals::{VitalReading, VitalSign};

/// Score at or above which the tier is CRITICAL.
const CRITICAL_SCORE: u32 = 5;
/// Abnormal-signal count at or above which the tier is CRITICAL.
const CRITICAL_COUNT: usize = 3;
const HIGH_SCORE: u32 = 3;
const HIGH_COUNT: usize = 2;
const MEDIUM_SCORE: u32 = 1;
const MEDIUM_COUNT: usize = 1;

/// Discrete severity classification, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl FromStr for Tier {
    type Err = CoreError;

    /// Parse a stored label (`LOW`, `MEDIUM`, `HIGH`, `CRITICAL`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Tier::Low),
            "MEDIUM" => Ok(Tier::Medium),
            "HIGH" => Ok(Tier::High),
            "CRITICAL" => Ok(Tier::Critical),
            _ => Err(CoreError::Validation(format!("unknown triage tier '{s}'"))),
        }
    }
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Low => "LOW",
            Tier::Medium => "MEDIUM",
            Tier::High => "HIGH",
            Tier::Critical => "CRITICAL",
        }
    }

    /// Whether entering this tier warrants an escalation notification.
    pub fn is_escalated(self) -> bool {
        matches!(self, Tier::High | Tier::Critical)
    }

    /// Tier implied by the accumulated weight alone.
    pub fn from_score(score: u32) -> Self {
        if score >= CRITICAL_SCORE {
            Tier::Critical
        } else if score >= HIGH_SCORE {
            Tier::High
        } else if score >= MEDIUM_SCORE {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    /// Tier implied by the number of abnormal signals alone.
    pub fn from_abnormal_count(count: usize) -> Self {
        if count >= CRITICAL_COUNT {
            Tier::Critical
        } else if count >= HIGH_COUNT {
            Tier::High
        } else if count >= MEDIUM_COUNT {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    /// Either criterion can raise the tier; the more severe one binds.
    pub fn derive(score: u32, abnormal_count: usize) -> Self {
        Self::from_score(score).max(Self::from_abnormal_count(abnormal_count))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageAssessment {
    pub tier: Tier,
    /// Signals outside their normal range, in reporting order.
    pub abnormal_signals: BTreeSet<VitalSign>,
    /// Accumulated severity weight. Only used to derive `tier`.
    pub score: u32,
}

impl TriageAssessment {
    /// The assessment of a reading with nothing abnormal (or nothing measured).
    pub fn normal() -> Self {
        Self {
            tier: Tier::Low,
            abnormal_signals: BTreeSet::new(),
            score: 0,
        }
    }

    /// Display names of the abnormal signals, in reporting order.
    pub fn abnormal_signal_names(&self) -> Vec<&'static str> {
        self.abnormal_signals
            .iter()
            .map(|sign| sign.display_name())
            .collect()
    }
}

/// Evaluate a reading against a threshold table.
///
/// Total over any subset of present fields: missing fields and signals absent
/// from the table contribute nothing. An empty reading yields LOW with no
/// abnormal signals, the same as a fully normal one.
pub fn evaluate_vitals(reading: &VitalReading, thresholds: &ThresholdTable) -> TriageAssessment {
    let mut abnormal_signals = BTreeSet::new();
    let mut score = 0;

    for sign in VitalSign::ALL {
        let (Some(value), Some(threshold)) = (reading.value(sign), thresholds.get(sign)) else {
            continue;
        };
        if let Some(weight) = threshold.weight(value) {
            abnormal_signals.insert(sign);
            score += weight;
        }
    }

    TriageAssessment {
        tier: Tier::derive(score, abnormal_signals.len()),
        abnormal_signals,
        score,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
