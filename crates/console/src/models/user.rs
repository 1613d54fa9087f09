//! Operator account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use watchpost_core::{Email, Role, UserId};

/// A registered operator (domain type).
///
/// The password hash never leaves the credential store, so it is not a
/// field here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized (lowercase) email address.
    pub email: Email,
    /// Whether this operator may manage other accounts.
    pub is_admin: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The operator's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        Role::from_is_admin(self.is_admin)
    }
}

/// Insert payload for a new operator. `secret_hash` is already an Argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub secret_hash: String,
    pub is_admin: bool,
}
