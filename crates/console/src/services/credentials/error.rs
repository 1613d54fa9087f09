//! Credential store error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during credential operations.
///
/// A failed login is not an error: `verify` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] watchpost_core::EmailError),

    /// Secret does not meet requirements.
    #[error("weak secret: {0}")]
    WeakSecret(String),

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    DuplicateIdentity,

    /// The operation would leave no admin account.
    #[error("cannot remove the last admin account")]
    LastAdminViolation,

    /// No account with the given ID.
    #[error("user not found")]
    NotFound,

    /// Hashing failed or the work factor is invalid.
    #[error("secret hashing failed")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
