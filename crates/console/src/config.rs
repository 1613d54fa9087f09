//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Storage
//! - `WATCHPOST_STORAGE` - `postgres` (default) or `memory`
//! - `WATCHPOST_DATABASE_URL` - `PostgreSQL` connection string, required for
//!   `postgres` storage (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `WATCHPOST_HOST` - Bind address (default: 127.0.0.1)
//! - `WATCHPOST_PORT` - Listen port (default: 5000)
//! - `WATCHPOST_BASE_URL` - Public URL, `https://` enables secure cookies
//!   (default: <http://localhost:5000>)
//! - `WATCHPOST_SESSION_TTL_SECS` - Session lifetime; unset means sessions never expire
//! - `WATCHPOST_ROLE_POLICY` - `snapshot` (default) or `live`
//! - `WATCHPOST_BOOTSTRAP_EMAIL` - Email of the admin seeded into an empty store
//! - `WATCHPOST_BOOTSTRAP_SECRET` - Its initial secret (placeholder and entropy checked)
//! - `WATCHPOST_ARGON2_MEMORY_KIB`, `WATCHPOST_ARGON2_ITERATIONS`,
//!   `WATCHPOST_ARGON2_PARALLELISM` - Hashing work factor
//! - `WATCHPOST_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `WATCHPOST_TLS_CERT` - PEM-encoded certificate chain
//! - `WATCHPOST_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use watchpost_core::Email;

use crate::services::{HashingParams, RolePolicy};

/// Email of the admin created on an empty store.
pub const DEFAULT_BOOTSTRAP_EMAIL: &str = "admin@watchpost.local";

/// Initial secret of the bootstrap admin. Well known; rotate after deploy.
pub const DEFAULT_BOOTSTRAP_SECRET: &str = "watchpost-admin";

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Where operator and alert records live.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// `PostgreSQL` (connection URL contains a password).
    Postgres { database_url: SecretString },
    /// Process memory; lost on restart.
    Memory,
}

/// The admin seeded into an empty store.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Bootstrap admin email (normalized)
    pub email: String,
    /// Initial secret
    pub secret: SecretString,
    /// Whether `secret` is the well-known default
    pub is_default_secret: bool,
}

/// Console application configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backing store
    pub storage: StorageConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the console
    pub base_url: String,
    /// Session lifetime (`None` = no expiry)
    pub session_ttl: Option<Duration>,
    /// Whether the gate trusts the role captured at login
    pub role_policy: RolePolicy,
    /// Admin seeded into an empty store
    pub bootstrap: BootstrapConfig,
    /// Argon2 work factor
    pub hashing: HashingParams,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("WATCHPOST_TLS_CERT");
        let key_pem = get_optional_env("WATCHPOST_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "WATCHPOST_TLS_*".to_string(),
                "Both WATCHPOST_TLS_CERT and WATCHPOST_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl StorageConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let kind = get_env_or_default("WATCHPOST_STORAGE", "postgres");
        let database_url = std::env::var("WATCHPOST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .ok();
        parse_storage(&kind, database_url)
    }
}

impl BootstrapConfig {
    fn from_env() -> Result<Self, ConfigError> {
        bootstrap_from(
            get_optional_env("WATCHPOST_BOOTSTRAP_EMAIL"),
            get_optional_env("WATCHPOST_BOOTSTRAP_SECRET"),
        )
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if an overridden bootstrap secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let storage = StorageConfig::from_env()?;
        let host: IpAddr = parse_env("WATCHPOST_HOST", "127.0.0.1")?;
        let port: u16 = parse_env("WATCHPOST_PORT", "5000")?;
        let base_url = get_env_or_default("WATCHPOST_BASE_URL", "http://localhost:5000");
        let session_ttl = parse_ttl(get_optional_env("WATCHPOST_SESSION_TTL_SECS"))?;
        let role_policy: RolePolicy = parse_env("WATCHPOST_ROLE_POLICY", "snapshot")?;
        let bootstrap = BootstrapConfig::from_env()?;

        let defaults = HashingParams::default();
        let hashing = HashingParams {
            memory_kib: parse_env("WATCHPOST_ARGON2_MEMORY_KIB", &defaults.memory_kib.to_string())?,
            iterations: parse_env("WATCHPOST_ARGON2_ITERATIONS", &defaults.iterations.to_string())?,
            parallelism: parse_env(
                "WATCHPOST_ARGON2_PARALLELISM",
                &defaults.parallelism.to_string(),
            )?,
        };

        let log_json = get_optional_env("WATCHPOST_LOG_JSON").is_some();
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            storage,
            host,
            port,
            base_url,
            session_ttl,
            role_policy,
            bootstrap,
            hashing,
            log_json,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// In-memory configuration with every default applied.
    ///
    /// Used for local runs and tests; no environment is read.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            storage: StorageConfig::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            base_url: "http://localhost:5000".to_string(),
            session_ttl: None,
            role_policy: RolePolicy::Snapshot,
            bootstrap: BootstrapConfig::default_admin(),
            hashing: HashingParams::default(),
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
            tls: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    /// The `PostgreSQL` URL, if storage is `PostgreSQL`.
    #[must_use]
    pub const fn database_url(&self) -> Option<&SecretString> {
        match &self.storage {
            StorageConfig::Postgres { database_url } => Some(database_url),
            StorageConfig::Memory => None,
        }
    }
}

impl BootstrapConfig {
    fn default_admin() -> Self {
        Self {
            email: DEFAULT_BOOTSTRAP_EMAIL.to_string(),
            secret: SecretString::from(DEFAULT_BOOTSTRAP_SECRET),
            is_default_secret: true,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_storage(kind: &str, database_url: Option<String>) -> Result<StorageConfig, ConfigError> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageConfig::Memory),
        "postgres" => database_url
            .map(|url| StorageConfig::Postgres {
                database_url: SecretString::from(url),
            })
            .ok_or_else(|| ConfigError::MissingEnvVar("WATCHPOST_DATABASE_URL".to_string())),
        other => Err(ConfigError::InvalidEnvVar(
            "WATCHPOST_STORAGE".to_string(),
            format!("{other} (expected postgres or memory)"),
        )),
    }
}

fn parse_ttl(raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let secs = raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("WATCHPOST_SESSION_TTL_SECS".to_string(), e.to_string())
    })?;

    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "WATCHPOST_SESSION_TTL_SECS".to_string(),
            "must be positive; unset it to disable expiry".to_string(),
        ));
    }

    Ok(Some(Duration::from_secs(secs)))
}

fn bootstrap_from(
    email: Option<String>,
    secret: Option<String>,
) -> Result<BootstrapConfig, ConfigError> {
    let defaults = BootstrapConfig::default_admin();

    let email = match email {
        Some(raw) => Email::parse(&raw)
            .map_err(|e| {
                ConfigError::InvalidEnvVar("WATCHPOST_BOOTSTRAP_EMAIL".to_string(), e.to_string())
            })?
            .into_inner(),
        None => defaults.email,
    };

    match secret {
        Some(raw) => {
            validate_secret_strength(&raw, "WATCHPOST_BOOTSTRAP_SECRET")?;
            Ok(BootstrapConfig {
                email,
                secret: SecretString::from(raw),
                is_default_secret: false,
            })
        }
        None => Ok(BootstrapConfig {
            email,
            ..defaults
        }),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
