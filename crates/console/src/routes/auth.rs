//! Login and logout.
//!
//! Two transports over the same credential check and session manager:
//! JSON under `/api/auth` returning a bearer token, and form posts under
//! `/auth` that keep the token in the cookie session and redirect.
//!
//! Unknown emails and wrong secrets are indistinguishable to the caller.

use axum::{
    Form, Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session as CookieSession;

use watchpost_core::{Role, UserId};

use crate::error::{AppError, clear_sentry_user};
use crate::middleware::{PresentedToken, clear_session_token, set_session_token};
use crate::models::{SessionToken, User};
use crate::state::AppState;

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(api_login))
        .route("/api/auth/logout", post(api_logout))
        .route("/auth/login", get(login_page).post(form_login))
        .route("/auth/logout", post(form_logout))
}

/// Login request (JSON or form).
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub secret: String,
}

/// Successful API login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_token: String,
    pub user_id: UserId,
    pub role: Role,
}

/// Query parameters on the login page.
#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub error: Option<String>,
}

/// Verify credentials and start a session.
async fn login(state: &AppState, request: &LoginRequest) -> Result<(User, SessionToken), AppError> {
    let user = state
        .credentials()
        .verify(&request.email, &request.secret)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = state.sessions().start(&user).await;
    tracing::info!(user_id = %user.id, "Operator logged in");

    Ok((user, token))
}

/// Log in and receive a bearer token.
///
/// POST /api/auth/login
async fn api_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (user, token) = login(&state, &request).await?;

    Ok(Json(LoginResponse {
        session_token: token.as_str().to_owned(),
        user_id: user.id,
        role: user.role(),
    }))
}

/// End the presented session. Always succeeds.
///
/// POST /api/auth/logout
async fn api_logout(
    State(state): State<AppState>,
    PresentedToken(token): PresentedToken,
) -> Json<serde_json::Value> {
    if let Some(token) = token {
        state.sessions().end(&token).await;
    }
    clear_sentry_user();

    Json(serde_json::json!({ "ok": true }))
}

/// Where browsers land when they need to log in.
///
/// GET /auth/login
async fn login_page(Query(query): Query<LoginPageQuery>) -> impl IntoResponse {
    Json(serde_json::json!({
        "login_required": true,
        "error": query.error,
    }))
}

/// Browser form login.
///
/// POST /auth/login
async fn form_login(
    State(state): State<AppState>,
    cookie_session: CookieSession,
    Form(request): Form<LoginRequest>,
) -> Result<Redirect, AppError> {
    match login(&state, &request).await {
        Ok((_, token)) => {
            set_session_token(&cookie_session, &token)
                .await
                .map_err(|e| AppError::Internal(format!("cookie session: {e}")))?;
            Ok(Redirect::to("/"))
        }
        Err(AppError::InvalidCredentials) => Ok(Redirect::to("/auth/login?error=credentials")),
        Err(e) => Err(e),
    }
}

/// Browser logout.
///
/// POST /auth/logout
async fn form_logout(State(state): State<AppState>, cookie_session: CookieSession) -> Redirect {
    // Clear the token from the cookie session, then end the console session
    if let Ok(Some(token)) = clear_session_token(&cookie_session).await {
        state.sessions().end(&token).await;
    }
    clear_sentry_user();

    Redirect::to("/auth/login")
}
