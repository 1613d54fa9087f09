//! CLI command implementations.

pub mod alert;
pub mod bootstrap;
pub mod migrate;
pub mod user;

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use watchpost_console::ConsoleConfig;
use watchpost_console::config::ConfigError;
use watchpost_console::db::{self, PgUserRepository};
use watchpost_console::services::{AlertError, CredentialError, CredentialService, SecretHasher};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Commands operate on `PostgreSQL` only.
    #[error("WATCHPOST_STORAGE=memory has nothing to manage; point the CLI at PostgreSQL")]
    MemoryStorage,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Credential store operation failed.
    #[error("{0}")]
    Credential(#[from] CredentialError),

    /// Alert operation failed.
    #[error("{0}")]
    Alert(#[from] AlertError),

    /// Reading input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input was empty or unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Load configuration and connect to `PostgreSQL`.
async fn connect() -> Result<(ConsoleConfig, PgPool), CliError> {
    let config = ConsoleConfig::from_env()?;
    let database_url = config.database_url().ok_or(CliError::MemoryStorage)?;

    tracing::info!("Connecting to watchpost database...");
    let pool = db::create_pool(database_url).await?;

    Ok((config, pool))
}

/// Credential service over the `PostgreSQL` user repository.
async fn credentials() -> Result<CredentialService, CliError> {
    let (config, pool) = connect().await?;
    let hasher = SecretHasher::new(config.hashing)?;
    Ok(CredentialService::new(
        Arc::new(PgUserRepository::new(pool)),
        hasher,
    ))
}
