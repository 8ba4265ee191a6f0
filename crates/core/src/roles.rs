//! Well-known caregiver role name constants.
//!
//! Carried in escalation notification metadata so downstream channels can
//! route by role.

pub const ROLE_DOCTOR: &str = "doctor";
pub const ROLE_NURSE: &str = "nurse";
