//! Dashboard counts for `PostgreSQL`.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, StatsStore};
use crate::models::SystemStats;

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total_persons: i64,
    active_cameras: i64,
    alerts: i64,
    unacknowledged_alerts: i64,
    detections: i64,
}

/// `PostgreSQL`-backed [`StatsStore`].
#[derive(Debug, Clone)]
pub struct PgStatsRepository {
    pool: PgPool,
}

impl PgStatsRepository {
    /// Create a new stats repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for PgStatsRepository {
    async fn system_stats(&self) -> Result<SystemStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM watchpost.persons) AS total_persons,
                (SELECT COUNT(*) FROM watchpost.camera_feeds) AS active_cameras,
                (SELECT COUNT(*) FROM watchpost.alerts) AS alerts,
                (SELECT COUNT(*) FROM watchpost.alerts WHERE NOT acknowledged) AS unacknowledged_alerts,
                (SELECT COUNT(*) FROM watchpost.detections) AS detections
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SystemStats {
            total_persons: row.total_persons,
            active_cameras: row.active_cameras,
            alerts: row.alerts,
            unacknowledged_alerts: row.unacknowledged_alerts,
            detections: row.detections,
        })
    }
}
