//! Session manager.
//!
//! Sessions live in process memory keyed by an opaque random token. They do
//! not survive a restart and are not shared between nodes.
//!
//! A session keeps the role it was started with. Whether the gate trusts that
//! snapshot or re-reads the role on every request is decided by
//! [`RolePolicy`], not here.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;

use watchpost_core::UserId;

use crate::models::{Session, SessionToken, User};

/// How the gate treats the role stored in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RolePolicy {
    /// Trust the `is_admin` flag captured at login. A revoked admin keeps
    /// admin rights until their session ends.
    #[default]
    Snapshot,
    /// Re-read the role from the credential store on every check.
    Live,
}

impl std::str::FromStr for RolePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "snapshot" => Ok(Self::Snapshot),
            "live" => Ok(Self::Live),
            other => Err(format!("invalid role policy: {other} (expected snapshot or live)")),
        }
    }
}

/// Issues, resolves and ends sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionToken, Session>>,
    ttl: Option<TimeDelta>,
}

impl SessionManager {
    /// Create a session manager. `ttl = None` means sessions never expire.
    #[must_use]
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            sessions: RwLock::default(),
            ttl: ttl.map(|d| TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)),
        }
    }

    /// Start a new session for a verified user.
    ///
    /// Every call creates a fresh session; a user may hold several.
    pub async fn start(&self, user: &User) -> SessionToken {
        let token = SessionToken::generate();
        let session = Session::for_user(user, Utc::now());

        self.sessions.write().await.insert(token.clone(), session);
        tracing::debug!(user_id = %user.id, "Session started");

        token
    }

    /// Resolve a token to its session.
    ///
    /// Returns `None` for unknown and expired tokens. An expired entry is
    /// removed here.
    pub async fn current(&self, token: &SessionToken) -> Option<Session> {
        let now = Utc::now();

        {
            let sessions = self.sessions.read().await;
            let session = sessions.get(token)?;
            if !self.is_expired(session, now) {
                return Some(session.clone());
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions.get(token).is_some_and(|s| self.is_expired(s, now)) {
            sessions.remove(token);
            tracing::debug!("Expired session removed");
        }

        None
    }

    /// End a session. Unknown tokens are ignored.
    pub async fn end(&self, token: &SessionToken) {
        if self.sessions.write().await.remove(token).is_some() {
            tracing::debug!("Session ended");
        }
    }

    /// End every session belonging to `user_id`. Returns how many were ended.
    ///
    /// Matches on ID, not email, so a later account reusing the email keeps
    /// its sessions.
    pub async fn revoke_all(&self, user_id: UserId) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }

    /// Number of sessions currently held, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no sessions are held.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn is_expired(&self, session: &Session, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| {
            session
                .created_at
                .checked_add_signed(ttl)
                .is_some_and(|expires_at| now >= expires_at)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use watchpost_core::Email;

    use super::*;

    fn user(id: i32, email: &str, is_admin: bool) -> User {
        User {
            id: UserId::new(id),
            email: Email::parse(email).unwrap(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_start_and_current() {
        let manager = SessionManager::new(None);
        let admin = user(1, "admin@site.test", true);

        let token = manager.start(&admin).await;
        let session = manager.current(&token).await.unwrap();

        assert_eq!(session.user_id, admin.id);
        assert_eq!(session.subject_email, admin.email);
        assert!(session.is_admin);
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_none() {
        let manager = SessionManager::new(None);
        let token = SessionToken::from_presented("forged");
        assert!(manager.current(&token).await.is_none());
    }

    #[tokio::test]
    async fn test_end_is_idempotent() {
        let manager = SessionManager::new(None);
        let token = manager.start(&user(1, "op@site.test", false)).await;

        manager.end(&token).await;
        manager.end(&token).await;

        assert!(manager.current(&token).await.is_none());
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_multiple_sessions_per_user() {
        let manager = SessionManager::new(None);
        let op = user(2, "op@site.test", false);

        let a = manager.start(&op).await;
        let b = manager.start(&op).await;
        assert_ne!(a, b);

        manager.end(&a).await;
        assert!(manager.current(&b).await.is_some());
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately_and_is_removed() {
        let manager = SessionManager::new(Some(Duration::ZERO));
        let token = manager.start(&user(1, "op@site.test", false)).await;

        assert!(manager.current(&token).await.is_none());
        assert_eq!(manager.len().await, 0);
    }

    #[tokio::test]
    async fn test_long_ttl_keeps_session() {
        let manager = SessionManager::new(Some(Duration::from_secs(3600)));
        let token = manager.start(&user(1, "op@site.test", false)).await;
        assert!(manager.current(&token).await.is_some());
    }

    #[tokio::test]
    async fn test_revoke_all_only_hits_one_user() {
        let manager = SessionManager::new(None);
        let gone = user(1, "gone@site.test", false);
        let stays = user(2, "stays@site.test", false);

        manager.start(&gone).await;
        manager.start(&gone).await;
        let kept = manager.start(&stays).await;

        assert_eq!(manager.revoke_all(gone.id).await, 2);
        assert!(manager.current(&kept).await.is_some());
        assert_eq!(manager.len().await, 1);
    }

    #[tokio::test]
    async fn test_revoke_all_spares_account_reusing_email() {
        let manager = SessionManager::new(None);
        let deleted = user(1, "guard@site.test", false);
        let recreated = user(3, "guard@site.test", false);

        manager.start(&deleted).await;
        let fresh = manager.start(&recreated).await;

        assert_eq!(manager.revoke_all(deleted.id).await, 1);
        assert_eq!(
            manager.current(&fresh).await.map(|s| s.user_id),
            Some(recreated.id)
        );
    }

    #[test]
    fn test_role_policy_parse() {
        assert_eq!("snapshot".parse::<RolePolicy>().unwrap(), RolePolicy::Snapshot);
        assert_eq!(" LIVE ".parse::<RolePolicy>().unwrap(), RolePolicy::Live);
        assert!("sometimes".parse::<RolePolicy>().is_err());
    }
}
