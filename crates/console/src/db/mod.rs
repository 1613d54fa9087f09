//! Persistence for the console.
//!
//! # Database: `watchpost` schema in `PostgreSQL`
//!
//! ## Tables
//!
//! - `users` - Operator identities (owned by the console)
//! - `alerts` - Raised security events (rows inserted by the detection producer,
//!   acknowledgment owned by the console)
//! - `persons`, `camera_feeds`, `detections` - Owned by the surveillance
//!   pipeline; the console only counts them
//!
//! # Stores
//!
//! Services talk to storage through [`UserStore`], [`AlertStore`] and
//! [`StatsStore`]. Every mutating method is atomic with respect to the
//! invariant it guards. Two implementations exist:
//!
//! - [`PgUserRepository`], [`PgAlertRepository`], [`PgStatsRepository`] - production
//! - [`MemoryStore`] - single-process, for tests and local development
//!
//! # Migrations
//!
//! Migrations are stored in `crates/console/migrations/` and run via:
//! ```bash
//! cargo run -p watchpost-cli -- migrate
//! ```

pub mod alerts;
pub mod memory;
pub mod stats;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use watchpost_core::{Acknowledgment, AlertId, Email, UserId};

use crate::models::{Alert, NewAlert, NewUser, SystemStats, User};

pub use alerts::PgAlertRepository;
pub use memory::MemoryStore;
pub use stats::PgStatsRepository;
pub use users::PgUserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The mutation would leave the store without an admin.
    #[error("operation would remove the last admin")]
    LastAdmin,
}

/// Operator identity storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is already registered.
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Insert `user` only if the store holds no users at all.
    ///
    /// The emptiness check and the insert happen atomically. Returns `None`
    /// when the store was not empty.
    async fn insert_if_empty(&self, user: NewUser) -> Result<Option<User>, RepositoryError>;

    /// Look up a user together with their stored secret hash.
    async fn find_with_secret(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Look up a user by email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Look up a user by ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// All users, newest first.
    async fn list_newest_first(&self) -> Result<Vec<User>, RepositoryError>;

    /// Delete a user unless doing so would leave zero admins.
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown ID and
    /// [`RepositoryError::LastAdmin`] when the guard refuses.
    async fn delete_guarding_last_admin(&self, id: UserId) -> Result<User, RepositoryError>;

    /// Number of admin users.
    async fn count_admins(&self) -> Result<i64, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Alert storage.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Insert a new alert in the raised state.
    async fn insert(&self, alert: NewAlert) -> Result<Alert, RepositoryError>;

    /// Atomically acknowledge an alert.
    ///
    /// Already-acknowledged alerts are returned unchanged with
    /// [`Acknowledgment::AlreadyAcknowledged`]. Returns
    /// [`RepositoryError::NotFound`] for an unknown ID.
    async fn acknowledge(
        &self,
        id: AlertId,
        at: DateTime<Utc>,
    ) -> Result<(Alert, Acknowledgment), RepositoryError>;

    /// Look up an alert by ID.
    async fn get(&self, id: AlertId) -> Result<Option<Alert>, RepositoryError>;

    /// All alerts, most recently triggered first.
    async fn list_newest_first(&self) -> Result<Vec<Alert>, RepositoryError>;
}

/// Read-only counts for the dashboard.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Row counts across the surveillance tables.
    async fn system_stats(&self) -> Result<SystemStats, RepositoryError>;
}

/// Map a sqlx unique-violation to [`RepositoryError::Conflict`].
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
