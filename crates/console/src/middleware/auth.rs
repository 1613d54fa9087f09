//! Authorization gate and the extractors that apply it.
//!
//! [`authorize`] is the single decision point: a pure function of the
//! resolved session and how sensitive the operation is. The extractors only
//! find the session (bearer header or browser cookie), call it, and turn the
//! decision into a response.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session as CookieSession;

use crate::error::{AppError, set_sentry_user};
use crate::models::{Identity, Session, SessionToken, session_keys};
use crate::services::RolePolicy;
use crate::state::AppState;

/// Login page browsers are sent to when they have no session.
pub const LOGIN_PATH: &str = "/auth/login";

/// How much an operation requires of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    /// Anyone.
    Public,
    /// Any signed-in operator.
    Authenticated,
    /// Signed-in admins only.
    AdminOnly,
}

/// Outcome of [`authorize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the operation, passing along the caller's identity if there is one.
    Proceed(Option<Identity>),
    /// No valid session for a protected operation.
    RedirectToLogin,
    /// Valid session, role too low.
    Forbidden,
}

/// Decide whether a caller may run an operation.
#[must_use]
pub fn authorize(session: Option<&Session>, sensitivity: Sensitivity) -> GateDecision {
    match (session, sensitivity) {
        (session, Sensitivity::Public) => GateDecision::Proceed(session.map(Session::identity)),
        (None, _) => GateDecision::RedirectToLogin,
        (Some(session), Sensitivity::AdminOnly) if !session.is_admin => GateDecision::Forbidden,
        (Some(session), _) => GateDecision::Proceed(Some(session.identity())),
    }
}

/// Extractor that requires any signed-in operator.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireOperator(operator): RequireOperator) -> impl IntoResponse {
///     format!("Hello, {}!", operator.email)
/// }
/// ```
pub struct RequireOperator(pub Identity);

/// Extractor that requires a signed-in admin.
///
/// Non-admins get 403 with "Access denied - Admin only".
pub struct RequireAdmin(pub Identity);

/// Rejection produced by the gate extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to login page (for browser requests).
    RedirectToLogin,
    /// 401 (for API requests).
    Unauthorized,
    /// 403, role too low.
    Forbidden,
    /// Resolving the session failed.
    Error(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Unauthorized => AppError::Unauthenticated.into_response(),
            Self::Forbidden => AppError::admin_only().into_response(),
            Self::Error(e) => e.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireOperator
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let identity = gate(parts, &state, Sensitivity::Authenticated).await?;
        identity.map(Self).ok_or(AuthRejection::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let identity = gate(parts, &state, Sensitivity::AdminOnly).await?;
        identity.map(Self).ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor for whatever session token the caller presented, valid or not.
///
/// Unlike the gate extractors, this never rejects. Used by logout, which must
/// succeed even for unknown tokens.
pub struct PresentedToken(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for PresentedToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(presented_token(parts).await))
    }
}

/// Resolve the caller's session and apply [`authorize`].
async fn gate(
    parts: &Parts,
    state: &AppState,
    sensitivity: Sensitivity,
) -> Result<Option<Identity>, AuthRejection> {
    let session = match presented_token(parts).await {
        Some(token) => resolve_session(state, &token)
            .await
            .map_err(AuthRejection::Error)?,
        None => None,
    };

    match authorize(session.as_ref(), sensitivity) {
        GateDecision::Proceed(identity) => {
            if let Some(identity) = &identity {
                tracing::Span::current().record("operator", identity.email.as_str());
                set_sentry_user(identity.user_id, &identity.email);
            }
            Ok(identity)
        }
        GateDecision::RedirectToLogin => {
            // Check if this is an API request
            if parts.uri.path().starts_with("/api/") {
                Err(AuthRejection::Unauthorized)
            } else {
                Err(AuthRejection::RedirectToLogin)
            }
        }
        GateDecision::Forbidden => {
            tracing::warn!(path = %parts.uri.path(), "Non-admin denied admin-only operation");
            Err(AuthRejection::Forbidden)
        }
    }
}

/// Find the session token: `Authorization: Bearer` first, then the cookie session.
pub async fn presented_token(parts: &Parts) -> Option<SessionToken> {
    if let Some(token) = bearer_token(parts) {
        return Some(token);
    }

    let cookie_session = parts.extensions.get::<CookieSession>()?;
    cookie_session
        .get::<SessionToken>(session_keys::SESSION_TOKEN)
        .await
        .ok()
        .flatten()
}

fn bearer_token(parts: &Parts) -> Option<SessionToken> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(SessionToken::from_presented(token))
}

/// Resolve a token to a session, applying the configured [`RolePolicy`].
///
/// Under [`RolePolicy::Live`] the role is re-read from the credential store,
/// and a session whose user no longer exists is ended.
///
/// # Errors
///
/// Returns `AppError::Credential` if the live role lookup fails.
pub async fn resolve_session(
    state: &AppState,
    token: &SessionToken,
) -> Result<Option<Session>, AppError> {
    let Some(mut session) = state.sessions().current(token).await else {
        return Ok(None);
    };

    if state.config().role_policy == RolePolicy::Live {
        match state.credentials().get(session.user_id).await? {
            Some(user) => session.is_admin = user.is_admin,
            None => {
                state.sessions().end(token).await;
                return Ok(None);
            }
        }
    }

    Ok(Some(session))
}

/// Helper to store the console session token in the browser session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_session_token(
    cookie_session: &CookieSession,
    token: &SessionToken,
) -> Result<(), tower_sessions::session::Error> {
    // New login, new cookie ID.
    cookie_session.cycle_id().await?;
    cookie_session
        .insert(session_keys::SESSION_TOKEN, token)
        .await
}

/// Helper to take the console session token out of the browser session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session_token(
    cookie_session: &CookieSession,
) -> Result<Option<SessionToken>, tower_sessions::session::Error> {
    let token = cookie_session
        .remove::<SessionToken>(session_keys::SESSION_TOKEN)
        .await?;
    cookie_session.flush().await?;
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use watchpost_core::{Email, Role, UserId};

    use super::*;

    fn session(is_admin: bool) -> Session {
        Session {
            user_id: UserId::new(1),
            subject_email: Email::parse("someone@site.test").unwrap(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_no_session_redirects_for_protected() {
        assert_eq!(
            authorize(None, Sensitivity::Authenticated),
            GateDecision::RedirectToLogin
        );
        assert_eq!(
            authorize(None, Sensitivity::AdminOnly),
            GateDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_public_always_proceeds() {
        assert_eq!(
            authorize(None, Sensitivity::Public),
            GateDecision::Proceed(None)
        );
        let operator = session(false);
        assert!(matches!(
            authorize(Some(&operator), Sensitivity::Public),
            GateDecision::Proceed(Some(_))
        ));
    }

    #[test]
    fn test_operator_forbidden_from_admin_only() {
        let operator = session(false);
        assert_eq!(
            authorize(Some(&operator), Sensitivity::AdminOnly),
            GateDecision::Forbidden
        );
        assert!(matches!(
            authorize(Some(&operator), Sensitivity::Authenticated),
            GateDecision::Proceed(Some(ref id)) if id.role == Role::Operator
        ));
    }

    #[test]
    fn test_admin_proceeds_with_identity() {
        let admin = session(true);
        let GateDecision::Proceed(Some(identity)) = authorize(Some(&admin), Sensitivity::AdminOnly)
        else {
            panic!("admin should proceed");
        };
        assert_eq!(identity.user_id, UserId::new(1));
        assert_eq!(identity.email.as_str(), "someone@site.test");
        assert!(identity.is_admin());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc123")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(bearer_token(&parts).unwrap().as_str(), "abc123");

        let request = axum::http::Request::builder()
            .header(header::AUTHORIZATION, "Basic abc123")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        assert!(bearer_token(&parts).is_none());
    }
}
