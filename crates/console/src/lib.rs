//! Watchpost Console library.
//!
//! Access control and alert lifecycle for the surveillance console:
//!
//! - Credential store: operator registration and secret verification
//! - Session manager: in-process sessions keyed by opaque tokens
//! - Authorization gate: one decision function behind every protected route
//! - Alert lifecycle manager: raise, acknowledge (one-way, idempotent), list
//!
//! Exposed as a library so the CLI and the integration tests drive the same
//! code the server does.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ConsoleConfig;
pub use error::AppError;
pub use state::AppState;
