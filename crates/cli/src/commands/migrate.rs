//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! watchpost migrate
//! ```
//!
//! # Environment Variables
//!
//! - `WATCHPOST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/console/migrations/`

use super::{CliError, connect};

/// Run the console migrations.
pub async fn run() -> Result<(), CliError> {
    let (_, pool) = connect().await?;

    tracing::info!("Running watchpost migrations...");
    sqlx::migrate!("../console/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
