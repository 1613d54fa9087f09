//! Cookie session layer for browser clients.
//!
//! The cookie session only carries the console session token; identity and
//! role live in the [`SessionManager`](crate::services::SessionManager).

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ConsoleConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "watchpost_session";

/// Create the browser session layer.
///
/// The cookie lives as long as the browser session unless a TTL is
/// configured, in which case it also expires after that much inactivity.
#[must_use]
pub fn create_session_layer(config: &ConsoleConfig) -> SessionManagerLayer<MemoryStore> {
    let expiry = config.session_ttl.map_or(Expiry::OnSessionEnd, |ttl| {
        let secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Expiry::OnInactivity(tower_sessions::cookie::time::Duration::seconds(secs))
    });

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(expiry)
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
