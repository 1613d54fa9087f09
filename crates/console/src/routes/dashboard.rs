//! Dashboard overview and the AI mode toggle.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::RequireOperator;
use crate::models::{Identity, SystemStats};
use crate::state::AppState;

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/api/dashboard", get(index))
        .route("/api/session", get(current_session))
        .route("/api/ai-mode/toggle", post(toggle_ai_mode))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub operator: Identity,
    pub stats: SystemStats,
    pub ai_mode: bool,
}

#[derive(Debug, Serialize)]
pub struct AiModeResponse {
    pub ai_mode: bool,
}

/// Counts across the surveillance tables plus the AI mode flag.
///
/// GET / (browsers without a session are redirected to login)
/// GET /api/dashboard
async fn index(
    RequireOperator(operator): RequireOperator,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let stats = state.stats().system_stats().await?;

    Ok(Json(DashboardResponse {
        operator,
        stats,
        ai_mode: state.ai_mode().is_enabled(),
    }))
}

/// The caller's resolved identity.
///
/// GET /api/session
async fn current_session(RequireOperator(operator): RequireOperator) -> Json<Identity> {
    Json(operator)
}

/// POST /api/ai-mode/toggle
async fn toggle_ai_mode(
    RequireOperator(operator): RequireOperator,
    State(state): State<AppState>,
) -> Json<AiModeResponse> {
    let ai_mode = state.ai_mode().toggle();
    tracing::info!(ai_mode, toggled_by = %operator.email, "AI mode toggled");
    Json(AiModeResponse { ai_mode })
}
