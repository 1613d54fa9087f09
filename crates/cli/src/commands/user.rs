//! Operator management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an operator (secret from WATCHPOST_NEW_USER_SECRET or stdin)
//! watchpost user create -e guard@example.com
//!
//! # Create an admin
//! watchpost user create -e chief@example.com --admin
//!
//! watchpost user list
//! watchpost user delete 4
//! ```

use std::io::BufRead;

use watchpost_core::UserId;

use super::{CliError, credentials};

/// Environment variable holding the new operator's secret.
const NEW_USER_SECRET_VAR: &str = "WATCHPOST_NEW_USER_SECRET";

/// Create a new operator.
///
/// # Returns
///
/// The ID of the created operator.
pub async fn create(email: &str, is_admin: bool) -> Result<UserId, CliError> {
    let secret = read_secret()?;
    let credentials = credentials().await?;

    let user = credentials.register(email, &secret, is_admin).await?;

    tracing::info!(
        "Operator created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role()
    );

    Ok(user.id)
}

/// Print every operator, newest first.
pub async fn list() -> Result<(), CliError> {
    let credentials = credentials().await?;
    let users = credentials.list_users().await?;
    let admins = credentials.admin_count().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{:>6}  {:<8}  {:<25}  EMAIL", "ID", "ROLE", "CREATED");
        for user in &users {
            println!(
                "{:>6}  {:<8}  {:<25}  {}",
                user.id,
                user.role().to_string(),
                user.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                user.email
            );
        }
        println!("{} operators, {admins} admins", users.len());
    }

    Ok(())
}

/// Delete an operator. Refused for the last admin.
///
/// The session table lives inside the running console, so this cannot end
/// sessions the operator already holds there. Under the `live` role policy
/// the console ends them on their next request; under `snapshot` they last
/// until logout, expiry or a console restart. `DELETE /api/users/{id}` ends
/// them immediately.
pub async fn delete(id: UserId) -> Result<(), CliError> {
    let deleted = credentials().await?.delete(id).await?;
    tracing::info!("Deleted operator {} ({})", deleted.id, deleted.email);
    tracing::warn!(
        "Sessions {} holds on a running console are not revoked by the CLI",
        deleted.email
    );
    Ok(())
}

fn read_secret() -> Result<String, CliError> {
    if let Ok(secret) = std::env::var(NEW_USER_SECRET_VAR) {
        return Ok(secret);
    }

    #[allow(clippy::print_stderr)]
    {
        eprintln!("Secret for the new operator (input is visible; prefer {NEW_USER_SECRET_VAR}):");
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let secret = line.trim_end_matches(['\r', '\n']).to_owned();

    if secret.is_empty() {
        return Err(CliError::InvalidInput("secret must not be empty".to_owned()));
    }
    Ok(secret)
}
