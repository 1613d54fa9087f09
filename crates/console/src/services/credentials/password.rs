//! Argon2id secret hashing.
//!
//! Hashes are PHC strings, so the work factor a hash was created with travels
//! with it and older hashes keep verifying after the configured factor changes.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use super::CredentialError;

/// Minimum secret length accepted at registration.
pub const MIN_SECRET_LENGTH: usize = 8;

/// Verified against when the presented email is unknown, so the miss costs the
/// same as a wrong secret.
const DUMMY_SECRET: &str = "watchpost-timing-equalizer";

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Salted, slow secret hasher.
///
/// Cloning is cheap; hashing runs on the blocking pool so request tasks are
/// not stalled for the duration of an Argon2 pass.
#[derive(Clone)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher")
            .field("params", self.argon2.params())
            .finish_non_exhaustive()
    }
}

impl SecretHasher {
    /// Build a hasher with the given work factor.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::PasswordHash` if the parameters are outside
    /// what Argon2 accepts.
    pub fn new(params: HashingParams) -> Result<Self, CredentialError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|_| CredentialError::PasswordHash)?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, DUMMY_SECRET)?;

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a secret with a fresh per-call salt.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::PasswordHash` if hashing fails.
    pub async fn hash(&self, secret: &str) -> Result<String, CredentialError> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || hash_with(&argon2, &secret))
            .await
            .map_err(|_| CredentialError::PasswordHash)?
    }

    /// Check a secret against a stored PHC hash in constant time.
    ///
    /// A malformed stored hash counts as a mismatch.
    pub async fn verify(&self, secret: &str, stored_hash: &str) -> bool {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();
        let stored_hash = stored_hash.to_owned();

        tokio::task::spawn_blocking(move || verify_with(&argon2, &secret, &stored_hash))
            .await
            .unwrap_or(false)
    }

    /// Burn one verification against the dummy hash.
    pub async fn verify_dummy(&self, secret: &str) {
        let dummy = self.dummy_hash.clone();
        let _ = self.verify(secret, &dummy).await;
    }
}

/// Reject secrets shorter than [`MIN_SECRET_LENGTH`] characters.
///
/// # Errors
///
/// Returns `CredentialError::WeakSecret` describing the requirement.
pub fn validate_secret(secret: &str) -> Result<(), CredentialError> {
    if secret.chars().count() < MIN_SECRET_LENGTH {
        return Err(CredentialError::WeakSecret(format!(
            "secret must be at least {MIN_SECRET_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Smallest parameters Argon2 accepts, to keep tests fast.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn fast_hasher() -> SecretHasher {
    SecretHasher::new(HashingParams {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap()
}

fn hash_with(argon2: &Argon2<'_>, secret: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    argon2
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| CredentialError::PasswordHash)
}

fn verify_with(argon2: &Argon2<'_>, secret: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    argon2.verify_password(secret.as_bytes(), &parsed).is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("correct horse").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse", &hash).await);
        assert!(!hasher.verify("wrong horse", &hash).await);
    }

    #[tokio::test]
    async fn test_same_secret_gets_distinct_salts() {
        let hasher = fast_hasher();
        let a = hasher.hash("same-secret").await.unwrap();
        let b = hasher.hash("same-secret").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_hash_is_mismatch() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("anything", "not-a-phc-string").await);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = SecretHasher::new(HashingParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        });
        assert!(matches!(result, Err(CredentialError::PasswordHash)));
    }

    #[test]
    fn test_validate_secret_length() {
        assert!(validate_secret("short").is_err());
        assert!(validate_secret("exactly8").is_ok());
        assert!(matches!(
            validate_secret("1234567"),
            Err(CredentialError::WeakSecret(_))
        ));
    }
}
