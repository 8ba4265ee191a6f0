//! Clinical threshold table consumed by the triage evaluator.
//!
//! Thresholds are policy, not algorithm: the table is built once (defaults,
//! optionally overridden from a JSON file) and handed to the evaluator.
//! Nothing in this module performs scoring.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::vitals::VitalSign;

/// Weight added for a value merely outside its normal range.
pub const DEFAULT_MILD_WEIGHT: u32 = 1;

/// Weight added for a value beyond a marked breakpoint.
pub const DEFAULT_MARKED_WEIGHT: u32 = 2;

/// Marked weight for oxygen desaturation, the fastest-decompensating sign.
pub const OXYGEN_MARKED_WEIGHT: u32 = 3;

/// Which side of the normal range counts as abnormal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Both low and high values are abnormal.
    #[default]
    Both,
    /// Only values below `min` are abnormal.
    LowOnly,
}

fn default_mild_weight() -> u32 {
    DEFAULT_MILD_WEIGHT
}

fn default_marked_weight() -> u32 {
    DEFAULT_MARKED_WEIGHT
}

/// Normal range and severity breakpoints for one signal.
///
/// `min` and `max` are inclusive. A value strictly below `marked_low` (or
/// strictly above `marked_high`) is a marked deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalThreshold {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub marked_low: Option<f64>,
    #[serde(default)]
    pub marked_high: Option<f64>,
    #[serde(default = "default_mild_weight")]
    pub mild_weight: u32,
    #[serde(default = "default_marked_weight")]
    pub marked_weight: u32,
    #[serde(default)]
    pub direction: Direction,
}

impl SignalThreshold {
    /// A two-sided range with the default weights.
    pub fn two_sided(min: f64, max: f64, marked_low: f64, marked_high: f64) -> Self {
        Self {
            min,
            max,
            marked_low: Some(marked_low),
            marked_high: Some(marked_high),
            mild_weight: DEFAULT_MILD_WEIGHT,
            marked_weight: DEFAULT_MARKED_WEIGHT,
            direction: Direction::Both,
        }
    }

    /// A range where only low values are abnormal.
    pub fn low_only(min: f64, max: f64, marked_low: f64, marked_weight: u32) -> Self {
        Self {
            min,
            max,
            marked_low: Some(marked_low),
            marked_high: None,
            mild_weight: DEFAULT_MILD_WEIGHT,
            marked_weight,
            direction: Direction::LowOnly,
        }
    }

    pub fn is_abnormal(&self, value: f64) -> bool {
        match self.direction {
            Direction::Both => value < self.min || value > self.max,
            Direction::LowOnly => value < self.min,
        }
    }

    /// Severity weight for `value`, or `None` when it is within range.
    pub fn weight(&self, value: f64) -> Option<u32> {
        if !self.is_abnormal(value) {
            return None;
        }

        let marked_low = self.marked_low.is_some_and(|b| value < b);
        let marked_high = self.direction == Direction::Both
            && self.marked_high.is_some_and(|b| value > b);

        if marked_low || marked_high {
            Some(self.marked_weight)
        } else {
            Some(self.mild_weight)
        }
    }

    fn validate(&self, sign: VitalSign) -> Result<(), CoreError> {
        let name = sign.as_str();
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(CoreError::Validation(format!(
                "{name}: range bounds must be finite"
            )));
        }
        if self.min > self.max {
            return Err(CoreError::Validation(format!(
                "{name}: min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }
        if let Some(low) = self.marked_low {
            if low >= self.min {
                return Err(CoreError::Validation(format!(
                    "{name}: marked_low ({low}) must be below min ({})",
                    self.min
                )));
            }
        }
        if let Some(high) = self.marked_high {
            if high <= self.max {
                return Err(CoreError::Validation(format!(
                    "{name}: marked_high ({high}) must be above max ({})",
                    self.max
                )));
            }
        }
        if self.mild_weight == 0 {
            return Err(CoreError::Validation(format!(
                "{name}: mild_weight must be at least 1"
            )));
        }
        if self.marked_weight < self.mild_weight {
            return Err(CoreError::Validation(format!(
                "{name}: marked_weight ({}) must not be below mild_weight ({})",
                self.marked_weight, self.mild_weight
            )));
        }
        Ok(())
    }
}

/// Per-signal thresholds. Signals missing from the table are never scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdTable {
    signals: BTreeMap<VitalSign, SignalThreshold>,
}

impl ThresholdTable {
    /// Build a table from explicit entries, validating each one.
    pub fn new(
        entries: impl IntoIterator<Item = (VitalSign, SignalThreshold)>,
    ) -> Result<Self, CoreError> {
        let table = Self {
            signals: entries.into_iter().collect(),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn get(&self, sign: VitalSign) -> Option<&SignalThreshold> {
        self.signals.get(&sign)
    }

    pub fn iter(&self) -> impl Iterator<Item = (VitalSign, &SignalThreshold)> {
        self.signals.iter().map(|(sign, t)| (*sign, t))
    }

    /// Replace the entry for one signal.
    pub fn set(&mut self, sign: VitalSign, threshold: SignalThreshold) -> Result<(), CoreError> {
        threshold.validate(sign)?;
        self.signals.insert(sign, threshold);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for (sign, threshold) in &self.signals {
            threshold.validate(*sign)?;
        }
        Ok(())
    }

    /// Parse a JSON object of per-signal overrides and merge it over the
    /// defaults.
    ///
    /// Each entry is merged field by field over the default entry for that
    /// signal, so fields left out (such as `direction` for oxygen saturation)
    /// keep their default values. An explicit `null` clears an optional
    /// breakpoint.
    ///
    /// ```json
    /// { "heart_rate": { "min": 55, "max": 105, "marked_low": 45, "marked_high": 130 } }
    /// ```
    pub fn from_json_overrides(json: &str) -> Result<Self, CoreError> {
        let overrides: BTreeMap<VitalSign, serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(json)
                .map_err(|e| CoreError::Validation(format!("invalid threshold file: {e}")))?;

        let mut table = Self::default();
        for (sign, fields) in overrides {
            let mut merged = match table.get(sign) {
                Some(current) => match serde_json::to_value(current) {
                    Ok(serde_json::Value::Object(map)) => map,
                    Ok(_) => serde_json::Map::new(),
                    Err(e) => return Err(CoreError::Internal(e.to_string())),
                },
                None => serde_json::Map::new(),
            };
            merged.extend(fields);

            let threshold: SignalThreshold =
                serde_json::from_value(serde_json::Value::Object(merged)).map_err(|e| {
                    CoreError::Validation(format!("invalid threshold for {}: {e}", sign.as_str()))
                })?;
            table.set(sign, threshold)?;
        }
        Ok(table)
    }

    /// Load overrides from a JSON file (see [`ThresholdTable::from_json_overrides`]).
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Internal(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_overrides(&contents)
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let signals = BTreeMap::from([
            (
                VitalSign::HeartRate,
                SignalThreshold::two_sided(60.0, 100.0, 50.0, 120.0),
            ),
            (
                VitalSign::SystolicBp,
                SignalThreshold::two_sided(90.0, 120.0, 80.0, 160.0),
            ),
            (
                VitalSign::DiastolicBp,
                SignalThreshold::two_sided(60.0, 80.0, 50.0, 100.0),
            ),
            (
                VitalSign::RespiratoryRate,
                SignalThreshold::two_sided(12.0, 20.0, 8.0, 30.0),
            ),
            (
                VitalSign::OxygenSaturation,
                SignalThreshold::low_only(95.0, 100.0, 90.0, OXYGEN_MARKED_WEIGHT),
            ),
            (
                VitalSign::Temperature,
                SignalThreshold::two_sided(36.1, 37.5, 35.0, 39.0),
            ),
        ]);
        Self { signals }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_table_covers_every_signal_and_is_valid() {
        let table = ThresholdTable::default();
        for sign in VitalSign::ALL {
            assert!(table.get(sign).is_some(), "{} missing", sign.as_str());
        }
        assert!(table.validate().is_ok());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let hr = ThresholdTable::default()
            .get(VitalSign::HeartRate)
            .cloned()
            .unwrap();
        assert_eq!(hr.weight(60.0), None);
        assert_eq!(hr.weight(100.0), None);
        assert_eq!(hr.weight(59.0), Some(1));
        assert_eq!(hr.weight(101.0), Some(1));
    }

    #[test]
    fn heart_rate_marked_breakpoints() {
        let hr = ThresholdTable::default()
            .get(VitalSign::HeartRate)
            .cloned()
            .unwrap();
        assert_eq!(hr.weight(50.0), Some(1));
        assert_eq!(hr.weight(49.0), Some(2));
        assert_eq!(hr.weight(120.0), Some(1));
        assert_eq!(hr.weight(121.0), Some(2));
    }

    #[test]
    fn oxygen_is_low_only_with_heavier_marked_weight() {
        let spo2 = ThresholdTable::default()
            .get(VitalSign::OxygenSaturation)
            .cloned()
            .unwrap();
        assert_eq!(spo2.weight(100.0), None);
        assert_eq!(spo2.weight(95.0), None);
        assert_eq!(spo2.weight(94.0), Some(1));
        assert_eq!(spo2.weight(90.0), Some(1));
        assert_eq!(spo2.weight(89.0), Some(3));
        assert!(!spo2.is_abnormal(101.0));
    }

    #[test]
    fn temperature_uses_fractional_bounds() {
        let temp = ThresholdTable::default()
            .get(VitalSign::Temperature)
            .cloned()
            .unwrap();
        assert_eq!(temp.weight(36.1), None);
        assert_eq!(temp.weight(37.5), None);
        assert_eq!(temp.weight(37.6), Some(1));
        assert_eq!(temp.weight(39.5), Some(2));
        assert_eq!(temp.weight(34.9), Some(2));
    }

    #[test]
    fn overrides_replace_only_named_signals() {
        let json = r#"{ "heart_rate": { "min": 55, "max": 105, "marked_low": 45, "marked_high": 130 } }"#;
        let table = ThresholdTable::from_json_overrides(json).unwrap();

        let hr = table.get(VitalSign::HeartRate).unwrap();
        assert_eq!(hr.min, 55.0);
        assert_eq!(hr.marked_weight, DEFAULT_MARKED_WEIGHT);
        assert_eq!(hr.direction, Direction::Both);

        assert_eq!(
            table.get(VitalSign::Temperature),
            ThresholdTable::default().get(VitalSign::Temperature)
        );
    }

    #[test]
    fn partial_override_keeps_default_fields() {
        let json = r#"{ "oxygen_saturation": { "min": 94 } }"#;
        let table = ThresholdTable::from_json_overrides(json).unwrap();

        let spo2 = table.get(VitalSign::OxygenSaturation).unwrap();
        assert_eq!(spo2.min, 94.0);
        assert_eq!(spo2.max, 100.0);
        assert_eq!(spo2.direction, Direction::LowOnly);
        assert_eq!(spo2.marked_weight, OXYGEN_MARKED_WEIGHT);
        assert_eq!(spo2.weight(93.0), Some(DEFAULT_MILD_WEIGHT));
    }

    #[test]
    fn override_can_clear_a_breakpoint() {
        let json = r#"{ "temperature": { "marked_high": null } }"#;
        let table = ThresholdTable::from_json_overrides(json).unwrap();

        let temp = table.get(VitalSign::Temperature).unwrap();
        assert_eq!(temp.marked_high, None);
        assert_eq!(
            temp.marked_low,
            ThresholdTable::default()
                .get(VitalSign::Temperature)
                .unwrap()
                .marked_low
        );
    }

    #[test]
    fn overrides_reject_unknown_signal() {
        let json = r#"{ "pulse": { "min": 55, "max": 105 } }"#;
        assert!(ThresholdTable::from_json_overrides(json).is_err());
    }

    #[test]
    fn overrides_reject_inverted_range() {
        let json = r#"{ "heart_rate": { "min": 110, "max": 100 } }"#;
        let err = ThresholdTable::from_json_overrides(json).unwrap_err();
        assert!(err.to_string().contains("min"));
    }

    #[test]
    fn overrides_reject_marked_inside_range() {
        let json = r#"{ "systolic_bp": { "min": 90, "max": 120, "marked_high": 110 } }"#;
        assert!(ThresholdTable::from_json_overrides(json).is_err());
    }

    #[test]
    fn overrides_reject_marked_weight_below_mild() {
        let json = r#"{ "systolic_bp": { "min": 90, "max": 120, "mild_weight": 2, "marked_weight": 1 } }"#;
        assert!(ThresholdTable::from_json_overrides(json).is_err());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "oxygen_saturation": {{ "min": 92, "max": 100, "marked_low": 88, "marked_weight": 3, "direction": "low_only" }} }}"#
        )
        .unwrap();

        let table = ThresholdTable::load(file.path()).unwrap();
        let spo2 = table.get(VitalSign::OxygenSaturation).unwrap();
        assert_eq!(spo2.min, 92.0);
        assert_eq!(spo2.direction, Direction::LowOnly);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let result = ThresholdTable::load(Path::new("/nonexistent/thresholds.json"));
        assert!(result.is_err());
    }

    #[test]
    fn table_serializes_with_signal_keys() {
        let json = serde_json::to_value(ThresholdTable::default()).unwrap();
        assert_eq!(json["heart_rate"]["min"], 60.0);
        assert_eq!(json["oxygen_saturation"]["direction"], "low_only");
    }
}
