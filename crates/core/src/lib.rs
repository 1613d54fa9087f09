//! Watchpost Core - Shared types library.
//!
//! This crate provides common types used across all Watchpost components:
//! - `console` - Access-control and alert-lifecycle service
//! - `cli` - Command-line tools for migrations and operator management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, roles and alert states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
