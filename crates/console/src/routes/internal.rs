//! Producer-facing endpoint for raising alerts.
//!
//! Not gated: the detection pipeline is a trusted internal caller and owns
//! its own trust boundary (network policy, private listener).

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};

use watchpost_core::{AlertId, CameraId, PersonId};

use crate::error::AppError;
use crate::state::AppState;

/// Build the internal router.
pub fn router() -> Router<AppState> {
    Router::new().route("/internal/alerts", post(raise))
}

#[derive(Debug, Deserialize)]
pub struct RaiseAlertRequest {
    #[serde(default)]
    pub person_id: Option<PersonId>,
    pub camera_id: CameraId,
}

#[derive(Debug, Serialize)]
pub struct RaisedAlertResponse {
    pub alert_id: AlertId,
}

/// POST /internal/alerts
async fn raise(
    State(state): State<AppState>,
    Json(request): Json<RaiseAlertRequest>,
) -> Result<(StatusCode, Json<RaisedAlertResponse>), AppError> {
    let alert = state
        .alerts()
        .raise(request.person_id, request.camera_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RaisedAlertResponse { alert_id: alert.id }),
    ))
}
