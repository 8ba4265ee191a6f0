pub mod patients;
pub mod triage;
