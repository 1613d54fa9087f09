//! Seed the bootstrap admin into an empty store.
//!
//! The server does this on every start; the command exists so a fresh
//! database can be prepared before the first deploy.

use std::sync::Arc;

use secrecy::ExposeSecret;

use watchpost_console::db::PgUserRepository;
use watchpost_console::services::{CredentialService, SecretHasher};

use super::{CliError, connect};

/// Create the bootstrap admin if no users exist.
pub async fn run() -> Result<(), CliError> {
    let (config, pool) = connect().await?;
    let credentials = CredentialService::new(
        Arc::new(PgUserRepository::new(pool)),
        SecretHasher::new(config.hashing)?,
    );

    let bootstrap = &config.bootstrap;
    match credentials
        .bootstrap(&bootstrap.email, bootstrap.secret.expose_secret())
        .await?
    {
        Some(admin) => {
            tracing::info!("Bootstrap admin created: {} (ID {})", admin.email, admin.id);
            if bootstrap.is_default_secret {
                tracing::warn!(
                    "The account uses the built-in default secret. Create a real admin and delete this one."
                );
            }
        }
        None => tracing::info!("Users already exist; nothing to do"),
    }

    Ok(())
}
