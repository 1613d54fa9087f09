//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::{ConsoleConfig, StorageConfig};
use crate::db::{
    self, AlertStore, MemoryStore, PgAlertRepository, PgStatsRepository, PgUserRepository,
    RepositoryError, StatsStore, UserStore,
};
use crate::models::User;
use crate::services::{
    AiMode, AlertService, CredentialError, CredentialService, SecretHasher, SessionManager,
};

/// Errors that can occur while assembling the application state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Could not connect to `PostgreSQL`.
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Hasher could not be built from the configured work factor.
    #[error("credential setup failed: {0}")]
    Credential(#[from] CredentialError),
}

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    users: Arc<dyn UserStore>,
    stats: Arc<dyn StatsStore>,
    credentials: CredentialService,
    alerts: AlertService,
    sessions: SessionManager,
    ai_mode: AiMode,
}

impl AppState {
    /// Assemble state over explicit stores.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Credential` if the hashing parameters are invalid.
    pub fn new(
        config: ConsoleConfig,
        users: Arc<dyn UserStore>,
        alerts: Arc<dyn AlertStore>,
        stats: Arc<dyn StatsStore>,
    ) -> Result<Self, StateError> {
        let hasher = SecretHasher::new(config.hashing)?;
        let sessions = SessionManager::new(config.session_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                credentials: CredentialService::new(Arc::clone(&users), hasher),
                alerts: AlertService::new(alerts),
                sessions,
                ai_mode: AiMode::new(),
                users,
                stats,
                config,
            }),
        })
    }

    /// Assemble state over a fresh [`MemoryStore`].
    ///
    /// # Errors
    ///
    /// Returns `StateError::Credential` if the hashing parameters are invalid.
    pub fn in_memory(config: ConsoleConfig) -> Result<Self, StateError> {
        let store = Arc::new(MemoryStore::new());
        let users: Arc<dyn UserStore> = store.clone();
        let alerts: Arc<dyn AlertStore> = store.clone();
        Self::new(config, users, alerts, store)
    }

    /// Assemble state for whatever storage `config` names, connecting to
    /// `PostgreSQL` if needed.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Database` if the pool cannot connect.
    pub async fn from_config(config: ConsoleConfig) -> Result<Self, StateError> {
        match &config.storage {
            StorageConfig::Memory => Self::in_memory(config),
            StorageConfig::Postgres { database_url } => {
                let pool = db::create_pool(database_url).await?;
                Self::new(
                    config,
                    Arc::new(PgUserRepository::new(pool.clone())),
                    Arc::new(PgAlertRepository::new(pool.clone())),
                    Arc::new(PgStatsRepository::new(pool)),
                )
            }
        }
    }

    /// Seed the configured bootstrap admin if the store is empty.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError` if seeding fails.
    pub async fn bootstrap(&self) -> Result<Option<User>, CredentialError> {
        let bootstrap = &self.inner.config.bootstrap;
        let created = self
            .inner
            .credentials
            .bootstrap(&bootstrap.email, bootstrap.secret.expose_secret())
            .await?;

        if created.is_some() && bootstrap.is_default_secret {
            tracing::warn!(
                "Bootstrap admin uses the built-in default secret. \
                 Log in and replace this account before exposing the console"
            );
        }

        Ok(created)
    }

    /// Check that the backing store answers.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it is unreachable.
    pub async fn ping_store(&self) -> Result<(), RepositoryError> {
        self.inner.users.ping().await
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialService {
        &self.inner.credentials
    }

    #[must_use]
    pub fn alerts(&self) -> &AlertService {
        &self.inner.alerts
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    #[must_use]
    pub fn stats(&self) -> &dyn StatsStore {
        self.inner.stats.as_ref()
    }

    #[must_use]
    pub fn ai_mode(&self) -> &AiMode {
        &self.inner.ai_mode
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::services::HashingParams;

    use super::*;

    fn fast_config() -> ConsoleConfig {
        ConsoleConfig {
            hashing: HashingParams {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
            ..ConsoleConfig::in_memory()
        }
    }

    #[tokio::test]
    async fn test_bootstrap_on_empty_store() {
        let state = AppState::in_memory(fast_config()).unwrap();

        let admin = state.bootstrap().await.unwrap().unwrap();
        assert_eq!(admin.email.as_str(), "admin@watchpost.local");
        assert!(admin.is_admin);

        assert!(state.bootstrap().await.unwrap().is_none());
        assert_eq!(state.credentials().list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_is_ready() {
        let state = AppState::in_memory(fast_config()).unwrap();
        assert!(state.ping_store().await.is_ok());
        assert!(!state.ai_mode().is_enabled());
    }
}
