//! Operator repository for `PostgreSQL`.
//!
//! Queries are checked at runtime (`sqlx::query_as`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use watchpost_core::{Email, UserId};

use super::{RepositoryError, UserStore, conflict_on_unique};
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, email, is_admin, created_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    email: String,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            is_admin: row.is_admin,
            created_at: row.created_at,
        })
    }
}

/// Internal row type for credential lookups.
#[derive(Debug, sqlx::FromRow)]
struct UserSecretRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO watchpost.users (email, password_hash, is_admin)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.email.as_str())
        .bind(&user.secret_hash)
        .bind(user.is_admin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        row.try_into()
    }

    async fn insert_if_empty(&self, user: NewUser) -> Result<Option<User>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Blocks concurrent inserts (but not reads) until commit, so two
        // processes booting against an empty table cannot both seed.
        sqlx::query("LOCK TABLE watchpost.users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM watchpost.users")
            .fetch_one(&mut *tx)
            .await?;

        if existing > 0 {
            tx.commit().await?;
            return Ok(None);
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO watchpost.users (email, password_hash, is_admin)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.email.as_str())
        .bind(&user.secret_hash)
        .bind(user.is_admin)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "email"))?;

        tx.commit().await?;

        row.try_into().map(Some)
    }

    async fn find_with_secret(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserSecretRow>(&format!(
            r"
            SELECT {USER_COLUMNS}, password_hash
            FROM watchpost.users
            WHERE lower(email) = $1
            "
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Ok((r.user.try_into()?, r.password_hash)))
            .transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM watchpost.users
            WHERE lower(email) = $1
            "
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM watchpost.users
            WHERE id = $1
            "
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_newest_first(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r"
            SELECT {USER_COLUMNS}
            FROM watchpost.users
            ORDER BY created_at DESC, id DESC
            "
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_guarding_last_admin(&self, id: UserId) -> Result<User, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Lock every admin row in a stable order first. Concurrent deletes
        // near the boundary queue up here instead of deadlocking, and the
        // loser re-counts after the winner commits.
        let admin_ids: Vec<i32> = sqlx::query_scalar(
            r"
            SELECT id FROM watchpost.users
            WHERE is_admin
            ORDER BY id
            FOR UPDATE
            ",
        )
        .fetch_all(&mut *tx)
        .await?;

        let target: Option<bool> = sqlx::query_scalar(
            r"
            SELECT is_admin FROM watchpost.users
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(target_is_admin) = target else {
            return Err(RepositoryError::NotFound);
        };

        if target_is_admin && admin_ids.len() <= 1 {
            return Err(RepositoryError::LastAdmin);
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            DELETE FROM watchpost.users
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    async fn count_admins(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM watchpost.users WHERE is_admin")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
