//! Business logic services for the console.
//!
//! # Services
//!
//! - `credentials` - Operator registration, secret verification, last-admin guard
//! - `sessions` - In-process session table
//! - `alerts` - Alert raise/acknowledge lifecycle
//! - `ai_mode` - Process-wide AI mode flag

pub mod ai_mode;
pub mod alerts;
pub mod credentials;
pub mod sessions;

pub use ai_mode::AiMode;
pub use alerts::{AlertError, AlertService};
pub use credentials::{CredentialError, CredentialService, HashingParams, SecretHasher};
pub use sessions::{RolePolicy, SessionManager};
