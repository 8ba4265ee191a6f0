//! Triage monitor runtime: per-patient state, on-edit evaluation and the
//! periodic sweep.

pub mod bootstrap;
pub mod config;
pub mod monitor;
pub mod notifications;
pub mod sweep;

pub use config::TriageConfig;
pub use monitor::{EvaluationOutcome, SweepSummary, TriageMonitor, TriagePreview};
