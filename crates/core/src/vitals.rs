//! Vital-sign readings and the signals they carry.
//!
//! A [`VitalReading`] is one observation set for a patient. Every measurement
//! is optional: an absent field means "not measured" and contributes nothing
//! to triage scoring.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Plausible body temperature bounds (°C) accepted at the input boundary.
const TEMPERATURE_PLAUSIBLE_MIN: f64 = 25.0;
const TEMPERATURE_PLAUSIBLE_MAX: f64 = 45.0;

/// The vital signs scored by the triage evaluator.
///
/// Declaration order is the order in which abnormal signals are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VitalSign {
    HeartRate,
    SystolicBp,
    DiastolicBp,
    RespiratoryRate,
    OxygenSaturation,
    Temperature,
}

impl VitalSign {
    /// Every signal, in reporting order.
    pub const ALL: [VitalSign; 6] = [
        VitalSign::HeartRate,
        VitalSign::SystolicBp,
        VitalSign::DiastolicBp,
        VitalSign::RespiratoryRate,
        VitalSign::OxygenSaturation,
        VitalSign::Temperature,
    ];

    /// Machine key used in configuration files and JSON payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            VitalSign::HeartRate => "heart_rate",
            VitalSign::SystolicBp => "systolic_bp",
            VitalSign::DiastolicBp => "diastolic_bp",
            VitalSign::RespiratoryRate => "respiratory_rate",
            VitalSign::OxygenSaturation => "oxygen_saturation",
            VitalSign::Temperature => "temperature",
        }
    }

    /// Human-readable name shown to caregivers and used in notifications.
    pub fn display_name(self) -> &'static str {
        match self {
            VitalSign::HeartRate => "Heart Rate",
            VitalSign::SystolicBp => "Systolic BP",
            VitalSign::DiastolicBp => "Diastolic BP",
            VitalSign::RespiratoryRate => "Respiratory Rate",
            VitalSign::OxygenSaturation => "Oxygen Saturation",
            VitalSign::Temperature => "Temperature",
        }
    }

    /// Measurement unit, for log and notification text.
    pub fn unit(self) -> &'static str {
        match self {
            VitalSign::HeartRate | VitalSign::RespiratoryRate => "/min",
            VitalSign::SystolicBp | VitalSign::DiastolicBp => "mmHg",
            VitalSign::OxygenSaturation => "%",
            VitalSign::Temperature => "°C",
        }
    }
}

impl FromStr for VitalSign {
    type Err = CoreError;

    /// Parse a machine key such as `oxygen_saturation`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VitalSign::ALL
            .into_iter()
            .find(|sign| sign.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("unknown vital sign '{s}'")))
    }
}

/// One observation set for a patient at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalReading {
    /// Beats per minute.
    #[serde(default)]
    pub heart_rate: Option<i32>,
    /// mmHg.
    #[serde(default)]
    pub systolic_bp: Option<i32>,
    /// mmHg.
    #[serde(default)]
    pub diastolic_bp: Option<i32>,
    /// Breaths per minute.
    #[serde(default)]
    pub respiratory_rate: Option<i32>,
    /// SpO2 percent.
    #[serde(default)]
    pub oxygen_saturation: Option<i32>,
    /// Degrees Celsius.
    #[serde(default)]
    pub temperature: Option<f64>,
    pub observed_at: Timestamp,
}

impl VitalReading {
    /// An empty reading observed at `observed_at`.
    pub fn empty(observed_at: Timestamp) -> Self {
        Self {
            heart_rate: None,
            systolic_bp: None,
            diastolic_bp: None,
            respiratory_rate: None,
            oxygen_saturation: None,
            temperature: None,
            observed_at,
        }
    }

    /// Value of a single signal as `f64`, or `None` when not measured.
    pub fn value(&self, sign: VitalSign) -> Option<f64> {
        match sign {
            VitalSign::HeartRate => self.heart_rate.map(f64::from),
            VitalSign::SystolicBp => self.systolic_bp.map(f64::from),
            VitalSign::DiastolicBp => self.diastolic_bp.map(f64::from),
            VitalSign::RespiratoryRate => self.respiratory_rate.map(f64::from),
            VitalSign::OxygenSaturation => self.oxygen_saturation.map(f64::from),
            VitalSign::Temperature => self.temperature,
        }
    }

    /// Number of signals actually measured in this reading.
    ///
    /// A zero count evaluates to the same LOW tier as a fully normal reading;
    /// callers that need to tell "no data" apart from "normal" check this.
    pub fn measured_count(&self) -> usize {
        VitalSign::ALL
            .iter()
            .filter(|sign| self.value(**sign).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.measured_count() == 0
    }

    /// Reject physiologically impossible values before they reach the evaluator.
    ///
    /// Intended for input boundaries (HTTP handlers, importers). The evaluator
    /// itself never validates.
    pub fn validate(&self) -> Result<(), CoreError> {
        let positive = [
            (VitalSign::HeartRate, self.heart_rate),
            (VitalSign::SystolicBp, self.systolic_bp),
            (VitalSign::DiastolicBp, self.diastolic_bp),
            (VitalSign::RespiratoryRate, self.respiratory_rate),
            (VitalSign::OxygenSaturation, self.oxygen_saturation),
        ];
        for (sign, value) in positive {
            if let Some(v) = value {
                if v <= 0 {
                    return Err(CoreError::Validation(format!(
                        "{} must be positive, got {v}",
                        sign.as_str()
                    )));
                }
            }
        }

        if let Some(spo2) = self.oxygen_saturation {
            if spo2 > 100 {
                return Err(CoreError::Validation(format!(
                    "oxygen_saturation cannot exceed 100, got {spo2}"
                )));
            }
        }

        if let Some(temp) = self.temperature {
            if !temp.is_finite()
                || !(TEMPERATURE_PLAUSIBLE_MIN..=TEMPERATURE_PLAUSIBLE_MAX).contains(&temp)
            {
                return Err(CoreError::Validation(format!(
                    "temperature must be between {TEMPERATURE_PLAUSIBLE_MIN} and \
                     {TEMPERATURE_PLAUSIBLE_MAX}, got {temp}"
                )));
            }
        }

        if let (Some(sys), Some(dia)) = (self.systolic_bp, self.diastolic_bp) {
            if dia > sys {
                return Err(CoreError::Validation(format!(
                    "diastolic_bp ({dia}) cannot exceed systolic_bp ({sys})"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
