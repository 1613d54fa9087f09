//! Alert lifecycle manager.
//!
//! Alerts are raised by the detection producer and acknowledged by operators.
//! Acknowledgment is one-way and repeatable: acknowledging an alert that is
//! already acknowledged succeeds and changes nothing.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::instrument;

use watchpost_core::{Acknowledgment, AlertId, CameraId, PersonId};

use crate::db::{AlertStore, RepositoryError};
use crate::models::{Alert, Identity, NewAlert};

/// Errors that can occur during alert operations.
#[derive(Debug, Error)]
pub enum AlertError {
    /// No alert with the given ID.
    #[error("alert not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AlertError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Alert lifecycle service.
#[derive(Clone)]
pub struct AlertService {
    alerts: Arc<dyn AlertStore>,
}

impl AlertService {
    /// Create a new alert service.
    #[must_use]
    pub fn new(alerts: Arc<dyn AlertStore>) -> Self {
        Self { alerts }
    }

    /// Record a new alert in the `Raised` state.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Repository` if the insert fails.
    #[instrument(skip(self))]
    pub async fn raise(
        &self,
        person_id: Option<PersonId>,
        camera_id: CameraId,
    ) -> Result<Alert, AlertError> {
        let alert = self
            .alerts
            .insert(NewAlert {
                person_id,
                camera_id,
            })
            .await?;

        tracing::info!(alert_id = %alert.id, "Alert raised");

        Ok(alert)
    }

    /// Acknowledge an alert on behalf of `by`.
    ///
    /// Returns the alert in its final state whether or not this call changed it.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::NotFound` for an unknown ID.
    #[instrument(skip(self, by), fields(operator = %by.email))]
    pub async fn acknowledge(&self, id: AlertId, by: &Identity) -> Result<Alert, AlertError> {
        let (alert, outcome) = self.alerts.acknowledge(id, Utc::now()).await?;

        match outcome {
            Acknowledgment::Transitioned => tracing::info!(
                alert_id = %alert.id,
                acknowledged_by = %by.email,
                "Alert acknowledged"
            ),
            Acknowledgment::AlreadyAcknowledged => {
                tracing::debug!(alert_id = %alert.id, "Alert already acknowledged");
            }
        }

        Ok(alert)
    }

    /// Look up one alert.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::NotFound` for an unknown ID.
    pub async fn get(&self, id: AlertId) -> Result<Alert, AlertError> {
        self.alerts.get(id).await?.ok_or(AlertError::NotFound)
    }

    /// All alerts, most recently triggered first.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Repository` if the store is unreachable.
    pub async fn list(&self) -> Result<Vec<Alert>, AlertError> {
        Ok(self.alerts.list_newest_first().await?)
    }
}
