//! Session-related types for operator authentication.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use watchpost_core::{Email, Role, UserId};

use super::user::User;

/// Number of random bytes in a session token (256 bits).
const TOKEN_BYTES: usize = 32;

/// Opaque bearer token naming one session.
///
/// `Debug` never prints the value so tokens cannot leak through logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a new cryptographically random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Wrap a token presented by a client.
    #[must_use]
    pub fn from_presented(raw: &str) -> Self {
        Self(raw.trim().to_owned())
    }

    /// The token value, for handing back to the client.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// A server-held session bound to a verified identity.
///
/// `is_admin` is the role snapshot taken when the session started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: UserId,
    pub subject_email: Email,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for a freshly verified user.
    #[must_use]
    pub fn for_user(user: &User, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user.id,
            subject_email: user.email.clone(),
            is_admin: user.is_admin,
            created_at: now,
        }
    }

    /// The identity this session acts as.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id,
            email: self.subject_email.clone(),
            role: Role::from_is_admin(self.is_admin),
        }
    }
}

/// Resolved caller identity handed to protected operations for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Email,
    pub role: Role,
}

impl Identity {
    /// Returns `true` if the caller holds the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Keys used in the browser cookie session.
pub mod keys {
    /// Key under which the console session token is kept.
    pub const SESSION_TOKEN: &str = "session_token";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_and_url_safe() {
        let a = SessionToken::generate();
        let b = SessionToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 43);
        assert!(
            a.as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SessionToken::from_presented("very-secret-token");
        let debug = format!("{token:?}");
        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("REDACTED"));
    }
}
