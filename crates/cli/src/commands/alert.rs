//! Producer-side alert commands.
//!
//! Lets an operator or a test harness stand in for the detection pipeline.

use std::sync::Arc;

use watchpost_console::db::PgAlertRepository;
use watchpost_console::services::AlertService;
use watchpost_core::{AlertId, CameraId, PersonId};

use super::{CliError, connect};

/// Raise an alert for `camera`, optionally naming the person seen.
pub async fn raise(camera: CameraId, person: Option<PersonId>) -> Result<AlertId, CliError> {
    let (_, pool) = connect().await?;
    let alerts = AlertService::new(Arc::new(PgAlertRepository::new(pool)));

    let alert = alerts.raise(person, camera).await?;
    tracing::info!("Alert {} raised for camera {}", alert.id, alert.camera_id);

    Ok(alert.id)
}
