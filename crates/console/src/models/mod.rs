//! Domain models for the console.
//!
//! Row types stay private to `db`; everything here is validated and safe to
//! hand to services and handlers.

pub mod alert;
pub mod session;
pub mod stats;
pub mod user;

pub use alert::{Alert, NewAlert};
pub use session::{Identity, Session, SessionToken, keys as session_keys};
pub use stats::SystemStats;
pub use user::{NewUser, User};
