//! Alert repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use watchpost_core::{Acknowledgment, AlertId, CameraId, PersonId};

use super::{AlertStore, RepositoryError};
use crate::models::{Alert, NewAlert};

const ALERT_COLUMNS: &str = "id, person_id, camera_id, triggered_at, acknowledged, acknowledged_at";

/// Internal row type for alert queries.
#[derive(Debug, sqlx::FromRow)]
struct AlertRow {
    id: i32,
    person_id: Option<i32>,
    camera_id: i32,
    triggered_at: DateTime<Utc>,
    acknowledged: bool,
    acknowledged_at: Option<DateTime<Utc>>,
}

impl From<AlertRow> for Alert {
    fn from(row: AlertRow) -> Self {
        Self {
            id: AlertId::new(row.id),
            person_id: row.person_id.map(PersonId::new),
            camera_id: CameraId::new(row.camera_id),
            triggered_at: row.triggered_at,
            acknowledged: row.acknowledged,
            acknowledged_at: row.acknowledged_at,
        }
    }
}

/// `PostgreSQL`-backed [`AlertStore`].
#[derive(Debug, Clone)]
pub struct PgAlertRepository {
    pool: PgPool,
}

impl PgAlertRepository {
    /// Create a new alert repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgAlertRepository {
    async fn insert(&self, alert: NewAlert) -> Result<Alert, RepositoryError> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r"
            INSERT INTO watchpost.alerts (person_id, camera_id)
            VALUES ($1, $2)
            RETURNING {ALERT_COLUMNS}
            "
        ))
        .bind(alert.person_id)
        .bind(alert.camera_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn acknowledge(
        &self,
        id: AlertId,
        at: DateTime<Utc>,
    ) -> Result<(Alert, Acknowledgment), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // The `NOT acknowledged` predicate is re-evaluated after any row lock
        // wait, so of two concurrent acknowledgments exactly one updates.
        let updated = sqlx::query_as::<_, AlertRow>(&format!(
            r"
            UPDATE watchpost.alerts
            SET acknowledged = TRUE, acknowledged_at = $2
            WHERE id = $1 AND NOT acknowledged
            RETURNING {ALERT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        let outcome = if let Some(row) = updated {
            (row.into(), Acknowledgment::Transitioned)
        } else {
            let existing = sqlx::query_as::<_, AlertRow>(&format!(
                r"
                SELECT {ALERT_COLUMNS}
                FROM watchpost.alerts
                WHERE id = $1
                "
            ))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

            (existing.into(), Acknowledgment::AlreadyAcknowledged)
        };

        tx.commit().await?;

        Ok(outcome)
    }

    async fn get(&self, id: AlertId) -> Result<Option<Alert>, RepositoryError> {
        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r"
            SELECT {ALERT_COLUMNS}
            FROM watchpost.alerts
            WHERE id = $1
            "
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_newest_first(&self) -> Result<Vec<Alert>, RepositoryError> {
        let rows = sqlx::query_as::<_, AlertRow>(&format!(
            r"
            SELECT {ALERT_COLUMNS}
            FROM watchpost.alerts
            ORDER BY triggered_at DESC, id DESC
            "
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
