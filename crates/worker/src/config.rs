use std::path::PathBuf;
use std::time::Duration;

use wardwatch_core::error::CoreError;
use wardwatch_core::escalation::EscalationPolicy;
use wardwatch_core::thresholds::ThresholdTable;

/// Default sweep interval (seconds).
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Default recipient for escalations on patients without an assigned caregiver.
const DEFAULT_WARD_RECIPIENT: &str = "ward-oncall";

/// Triage monitor configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    pub sweep_interval: Duration,
    /// JSON file of per-signal threshold overrides.
    pub thresholds_path: Option<PathBuf>,
    pub realert_after: Option<Duration>,
    pub ward_recipient: String,
    pub webhook_url: Option<String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            thresholds_path: None,
            realert_after: None,
            ward_recipient: DEFAULT_WARD_RECIPIENT.to_string(),
            webhook_url: None,
        }
    }
}

impl TriageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default        |
    /// |------------------------------|----------------|
    /// | `TRIAGE_SWEEP_INTERVAL_SECS` | `30`           |
    /// | `TRIAGE_THRESHOLDS_PATH`     | built-in table |
    /// | `TRIAGE_REALERT_SECS`        | disabled (`0`) |
    /// | `TRIAGE_WARD_RECIPIENT`      | `ward-oncall`  |
    /// | `TRIAGE_WEBHOOK_URL`         | disabled       |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let sweep_secs = parse_secs(&lookup, "TRIAGE_SWEEP_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        if sweep_secs == 0 {
            return Err(CoreError::Validation(
                "TRIAGE_SWEEP_INTERVAL_SECS must be greater than 0".to_string(),
            ));
        }

        let realert_after = parse_secs(&lookup, "TRIAGE_REALERT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            sweep_interval: Duration::from_secs(sweep_secs),
            thresholds_path: non_empty("TRIAGE_THRESHOLDS_PATH").map(PathBuf::from),
            realert_after,
            ward_recipient: non_empty("TRIAGE_WARD_RECIPIENT")
                .unwrap_or_else(|| DEFAULT_WARD_RECIPIENT.to_string()),
            webhook_url: non_empty("TRIAGE_WEBHOOK_URL"),
        })
    }

    /// The threshold table: defaults, overridden by the configured file.
    pub fn thresholds(&self) -> Result<ThresholdTable, CoreError> {
        match &self.thresholds_path {
            Some(path) => ThresholdTable::load(path),
            None => Ok(ThresholdTable::default()),
        }
    }

    pub fn policy(&self) -> EscalationPolicy {
        EscalationPolicy {
            realert_after: self.realert_after,
        }
    }
}

fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u64>, CoreError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| CoreError::Validation(format!("{key} must be a valid u64, got '{raw}'")))
        })
        .transpose()
}
