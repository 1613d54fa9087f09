//! Operator account management (admin only).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};

use watchpost_core::UserId;

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::state::AppState;

/// Build the users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(index).post(create))
        .route("/api/users/{id}", delete(destroy))
}

/// Request for creating an operator.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub secret: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// All operators, newest first.
#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// Created operator.
#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub user_id: UserId,
}

/// Outcome of a delete.
#[derive(Debug, Serialize)]
pub struct DeletedUserResponse {
    pub ok: bool,
    pub revoked_sessions: usize,
}

/// List operators.
///
/// GET /api/users
async fn index(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<UsersResponse>, AppError> {
    let users = state.credentials().list_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// Register an operator.
///
/// POST /api/users
async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreatedUserResponse>), AppError> {
    let user = state
        .credentials()
        .register(&request.email, &request.secret, request.is_admin)
        .await?;

    tracing::info!(
        user_id = %user.id,
        created_by = %admin.email,
        "Operator created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse { user_id: user.id }),
    ))
}

/// Delete an operator and end their sessions.
///
/// DELETE /api/users/{id}
async fn destroy(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<DeletedUserResponse>, AppError> {
    let deleted = state.credentials().delete(id).await?;
    let revoked_sessions = state.sessions().revoke_all(deleted.id).await;

    tracing::info!(
        user_id = %deleted.id,
        deleted_by = %admin.email,
        revoked_sessions,
        "Operator removed"
    );

    Ok(Json(DeletedUserResponse {
        ok: true,
        revoked_sessions,
    }))
}
