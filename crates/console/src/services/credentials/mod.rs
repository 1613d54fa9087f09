//! Credential store.
//!
//! Registers operators, verifies their secrets and guards the last-admin
//! invariant. Secrets are Argon2id hashed with a per-user salt before they
//! reach storage.

mod error;
pub mod password;

pub use error::CredentialError;
pub use password::{HashingParams, MIN_SECRET_LENGTH, SecretHasher};

use std::sync::Arc;

use tracing::instrument;

use watchpost_core::{Email, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Credential store service.
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserStore>,
    hasher: SecretHasher,
}

impl CredentialService {
    /// Create a new credential service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, hasher: SecretHasher) -> Self {
        Self { users, hasher }
    }

    /// Register a new operator.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidEmail` if the email format is invalid.
    /// Returns `CredentialError::WeakSecret` if the secret is too short.
    /// Returns `CredentialError::DuplicateIdentity` if the email (in any case)
    /// is already registered.
    #[instrument(skip(self, secret))]
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        is_admin: bool,
    ) -> Result<User, CredentialError> {
        let email = Email::parse(email)?;
        password::validate_secret(secret)?;

        let secret_hash = self.hasher.hash(secret).await?;

        let user = self
            .users
            .insert(NewUser {
                email,
                secret_hash,
                is_admin,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => CredentialError::DuplicateIdentity,
                other => CredentialError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, is_admin, "Operator registered");

        Ok(user)
    }

    /// Check an email/secret pair.
    ///
    /// Returns the user iff the secret matches. Unknown emails, malformed
    /// emails and wrong secrets all return `Ok(None)` after the same amount
    /// of hashing work.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Repository` only if the store is unreachable.
    #[instrument(skip(self, secret))]
    pub async fn verify(&self, email: &str, secret: &str) -> Result<Option<User>, CredentialError> {
        let Ok(email) = Email::parse(email) else {
            self.hasher.verify_dummy(secret).await;
            return Ok(None);
        };

        let Some((user, stored_hash)) = self.users.find_with_secret(&email).await? else {
            self.hasher.verify_dummy(secret).await;
            return Ok(None);
        };

        if self.hasher.verify(secret, &stored_hash).await {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Whether `email` names an admin. Unknown or malformed emails are not.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Repository` if the store is unreachable.
    pub async fn is_admin(&self, email: &str) -> Result<bool, CredentialError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(false);
        };

        Ok(self
            .users
            .get_by_email(&email)
            .await?
            .is_some_and(|u| u.is_admin))
    }

    /// Look up an operator by ID.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Repository` if the store is unreachable.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, CredentialError> {
        Ok(self.users.get_by_id(id).await?)
    }

    /// All operators, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Repository` if the store is unreachable.
    pub async fn list_users(&self) -> Result<Vec<User>, CredentialError> {
        Ok(self.users.list_newest_first().await?)
    }

    /// Number of admin accounts.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Repository` if the store is unreachable.
    pub async fn admin_count(&self) -> Result<i64, CredentialError> {
        Ok(self.users.count_admins().await?)
    }

    /// Delete an operator.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::NotFound` for an unknown ID.
    /// Returns `CredentialError::LastAdminViolation` if this is the only admin.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<User, CredentialError> {
        let user = self
            .users
            .delete_guarding_last_admin(id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CredentialError::NotFound,
                RepositoryError::LastAdmin => CredentialError::LastAdminViolation,
                other => CredentialError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Operator deleted");

        Ok(user)
    }

    /// Seed the default admin if the store holds no users.
    ///
    /// Returns the created admin, or `None` if the store was already
    /// populated. The seeded credential is well known and must be rotated.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::InvalidEmail` for a malformed email,
    /// `CredentialError::PasswordHash` if hashing fails, or
    /// `CredentialError::Repository` if the store is unreachable.
    #[instrument(skip(self, secret))]
    pub async fn bootstrap(
        &self,
        email: &str,
        secret: &str,
    ) -> Result<Option<User>, CredentialError> {
        let email = Email::parse(email)?;
        let secret_hash = self.hasher.hash(secret).await?;

        let created = self
            .users
            .insert_if_empty(NewUser {
                email,
                secret_hash,
                is_admin: true,
            })
            .await?;

        if let Some(user) = &created {
            tracing::warn!(
                email = %user.email,
                "Store was empty: created bootstrap admin. Rotate its credential now"
            );
        } else if self.users.count_admins().await? == 0 {
            tracing::warn!(
                "Users present but none is an admin; create one with `watchpost user create --admin`"
            );
        } else {
            tracing::debug!("Users present, bootstrap skipped");
        }

        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn service() -> CredentialService {
        CredentialService::new(Arc::new(MemoryStore::new()), password::fast_hasher())
    }

    #[tokio::test]
    async fn test_verify_any_email_case() {
        let creds = service();
        creds
            .register("guard@site.test", "night-shift-9", false)
            .await
            .unwrap();

        for variant in ["guard@site.test", "GUARD@SITE.TEST", "  Guard@Site.Test "] {
            let user = creds.verify(variant, "night-shift-9").await.unwrap();
            assert!(user.is_some(), "{variant} should verify");
            assert!(creds.verify(variant, "night-shift-8").await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_email_do_not_verify() {
        let creds = service();
        assert!(creds.verify("nobody@site.test", "whatever1").await.unwrap().is_none());
        assert!(creds.verify("not-an-email", "whatever1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_any_case() {
        let creds = service();
        creds.register("a@site.test", "secret-one", false).await.unwrap();

        let err = creds
            .register("A@SITE.test", "secret-two", true)
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let creds = service();
        assert!(matches!(
            creds.register("bad-email", "long-enough", false).await,
            Err(CredentialError::InvalidEmail(_))
        ));
        assert!(matches!(
            creds.register("ok@site.test", "short", false).await,
            Err(CredentialError::WeakSecret(_))
        ));
    }

    #[tokio::test]
    async fn test_is_admin_unknown_is_false() {
        let creds = service();
        creds.register("boss@site.test", "secret-boss", true).await.unwrap();

        assert!(creds.is_admin("BOSS@site.test").await.unwrap());
        assert!(!creds.is_admin("ghost@site.test").await.unwrap());
        assert!(!creds.is_admin("###").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_last_admin_refused() {
        let creds = service();
        let admin = creds.register("boss@site.test", "secret-boss", true).await.unwrap();
        let operator = creds.register("op@site.test", "secret-op1", false).await.unwrap();

        assert!(matches!(
            creds.delete(admin.id).await,
            Err(CredentialError::LastAdminViolation)
        ));
        creds.delete(operator.id).await.unwrap();
        assert!(matches!(
            creds.delete(operator.id).await,
            Err(CredentialError::NotFound)
        ));
        assert_eq!(creds.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_seeds_exactly_once() {
        let creds = service();
        let email = "admin@watchpost.local";

        let first = creds.bootstrap(email, "watchpost-admin").await.unwrap();
        assert!(first.is_some_and(|u| u.is_admin));
        assert!(creds.bootstrap(email, "watchpost-admin").await.unwrap().is_none());

        let users = creds.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(
            creds
                .verify("ADMIN@watchpost.local", "watchpost-admin")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_admin_count_tracks_registrations_and_deletes() {
        let creds = service();
        creds.bootstrap("admin@watchpost.local", "watchpost-admin").await.unwrap();
        assert_eq!(creds.admin_count().await.unwrap(), 1);

        let deputy = creds.register("deputy@site.test", "deputy-secret", true).await.unwrap();
        creds.register("guard@site.test", "guard-secret", false).await.unwrap();
        assert_eq!(creds.admin_count().await.unwrap(), 2);

        creds.delete(deputy.id).await.unwrap();
        assert_eq!(creds.admin_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bootstrap_skips_populated_store_without_admin() {
        let creds = service();
        creds.register("guard@site.test", "guard-secret", false).await.unwrap();

        assert!(creds.bootstrap("admin@watchpost.local", "watchpost-admin").await.unwrap().is_none());
        assert_eq!(creds.admin_count().await.unwrap(), 0);
        assert_eq!(creds.list_users().await.unwrap().len(), 1);
    }
}
