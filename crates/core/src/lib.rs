//! Ward triage domain logic.
//!
//! Everything in this crate is free of database and network access. The
//! evaluator ([`triage::evaluate_vitals`]) and the tier state machine
//! ([`escalation::apply_assessment`]) are pure functions; [`store`] defines
//! the storage seam implemented by the db crate.

pub mod channels;
pub mod clock;
pub mod error;
pub mod escalation;
pub mod notification;
pub mod roles;
pub mod store;
pub mod thresholds;
pub mod triage;
pub mod types;
pub mod vitals;
