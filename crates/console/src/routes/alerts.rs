//! Alert review and acknowledgment.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Serialize;

use watchpost_core::AlertId;

use crate::error::AppError;
use crate::middleware::RequireOperator;
use crate::models::Alert;
use crate::state::AppState;

/// Build the alerts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/alerts", get(index))
        .route("/api/alerts/{id}", get(show))
        .route("/api/alerts/{id}/acknowledge", post(acknowledge))
}

#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Serialize)]
pub struct AcknowledgeResponse {
    pub ok: bool,
    pub alert: Alert,
}

/// GET /api/alerts
async fn index(
    RequireOperator(_operator): RequireOperator,
    State(state): State<AppState>,
) -> Result<Json<AlertsResponse>, AppError> {
    let alerts = state.alerts().list().await?;
    Ok(Json(AlertsResponse { alerts }))
}

/// GET /api/alerts/{id}
async fn show(
    RequireOperator(_operator): RequireOperator,
    State(state): State<AppState>,
    Path(id): Path<AlertId>,
) -> Result<Json<Alert>, AppError> {
    Ok(Json(state.alerts().get(id).await?))
}

/// Acknowledge an alert. Repeating it is not an error.
///
/// POST /api/alerts/{id}/acknowledge
async fn acknowledge(
    RequireOperator(operator): RequireOperator,
    State(state): State<AppState>,
    Path(id): Path<AlertId>,
) -> Result<Json<AcknowledgeResponse>, AppError> {
    let alert = state.alerts().acknowledge(id, &operator).await?;
    Ok(Json(AcknowledgeResponse { ok: true, alert }))
}
