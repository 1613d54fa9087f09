//! Unified error handling for the console.
//!
//! Every error leaves as JSON: `{ "error": <kind>, "message": <text> }`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use watchpost_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::services::{AlertError, CredentialError};

/// Message returned to non-admins hitting an admin-only operation.
pub const ADMIN_ONLY_MESSAGE: &str = "Access denied - Admin only";

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Login failed. Same message whether the email or the secret was wrong.
    #[error("Invalid email or secret")]
    InvalidCredentials,

    /// No valid session.
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid session, insufficient role.
    #[error("{0}")]
    Forbidden(String),

    /// Credential store operation failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Alert lifecycle operation failed.
    #[error(transparent)]
    Alert(#[from] AlertError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl AppError {
    /// Shorthand for the admin-only denial.
    #[must_use]
    pub fn admin_only() -> Self {
        Self::Forbidden(ADMIN_ONLY_MESSAGE.to_string())
    }

    /// HTTP status and machine-readable kind.
    #[must_use]
    pub const fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            Self::Credential(CredentialError::DuplicateIdentity) => {
                (StatusCode::CONFLICT, "duplicate_identity")
            }
            Self::Credential(CredentialError::LastAdminViolation) => {
                (StatusCode::CONFLICT, "last_admin_violation")
            }
            Self::Credential(CredentialError::NotFound)
            | Self::Alert(AlertError::NotFound) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Credential(CredentialError::InvalidEmail(_) | CredentialError::WeakSecret(_)) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            Self::Credential(CredentialError::PasswordHash | CredentialError::Repository(_))
            | Self::Alert(AlertError::Repository(_))
            | Self::Database(_)
            | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Console request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: kind,
                message,
            }),
        )
            .into_response()
    }
}

/// Set the Sentry user context from the resolved operator.
pub fn set_sentry_user(user_id: UserId, email: &Email) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
