//! Ward triage HTTP server library.
//!
//! Exposes config, state, error handling, routes and WebSocket
//! infrastructure so integration tests and the binary share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
