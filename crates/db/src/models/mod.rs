//! Database row structs and their conversions to domain types.

pub mod patient;
