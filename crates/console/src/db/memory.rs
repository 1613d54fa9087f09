//! In-process store.
//!
//! Implements every store trait over a single `tokio::sync::RwLock`. Each
//! mutating call holds the write guard across its check and its write, which
//! gives the same atomicity the `PostgreSQL` repositories get from
//! transactions. Contents are lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use watchpost_core::{Acknowledgment, AlertId, Email, UserId};

use super::{AlertStore, RepositoryError, StatsStore, UserStore};
use crate::models::{Alert, NewAlert, NewUser, SystemStats, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<StoredUser>,
    alerts: Vec<Alert>,
    next_user_id: i32,
    next_alert_id: i32,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    secret_hash: String,
}

impl Tables {
    fn insert_user(&mut self, new: NewUser) -> Result<User, RepositoryError> {
        if self.users.iter().any(|u| u.user.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        self.next_user_id += 1;
        let user = User {
            id: UserId::new(self.next_user_id),
            email: new.email,
            is_admin: new.is_admin,
            created_at: Utc::now(),
        };
        self.users.push(StoredUser {
            user: user.clone(),
            secret_hash: new.secret_hash,
        });

        Ok(user)
    }

    fn admin_count(&self) -> usize {
        self.users.iter().filter(|u| u.user.is_admin).count()
    }
}

/// Single-process implementation of [`UserStore`], [`AlertStore`] and [`StatsStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.tables.write().await.insert_user(user)
    }

    async fn insert_if_empty(&self, user: NewUser) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.users.is_empty() {
            return Ok(None);
        }
        tables.insert_user(user).map(Some)
    }

    async fn find_with_secret(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.secret_hash.clone())))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| &u.user.email == email)
            .map(|u| u.user.clone()))
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn list_newest_first(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.iter().map(|u| u.user.clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn delete_guarding_last_admin(&self, id: UserId) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;

        let index = tables
            .users
            .iter()
            .position(|u| u.user.id == id)
            .ok_or(RepositoryError::NotFound)?;

        let is_admin = tables.users.get(index).is_some_and(|u| u.user.is_admin);
        if is_admin && tables.admin_count() <= 1 {
            return Err(RepositoryError::LastAdmin);
        }

        Ok(tables.users.remove(index).user)
    }

    async fn count_admins(&self) -> Result<i64, RepositoryError> {
        let count = self.tables.read().await.admin_count();
        i64::try_from(count).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert(&self, alert: NewAlert) -> Result<Alert, RepositoryError> {
        let mut tables = self.tables.write().await;
        tables.next_alert_id += 1;
        let alert = Alert {
            id: AlertId::new(tables.next_alert_id),
            person_id: alert.person_id,
            camera_id: alert.camera_id,
            triggered_at: Utc::now(),
            acknowledged: false,
            acknowledged_at: None,
        };
        tables.alerts.push(alert.clone());
        Ok(alert)
    }

    async fn acknowledge(
        &self,
        id: AlertId,
        at: DateTime<Utc>,
    ) -> Result<(Alert, Acknowledgment), RepositoryError> {
        let mut tables = self.tables.write().await;
        let alert = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;

        let (next, outcome) = alert.state().acknowledge();
        if outcome == Acknowledgment::Transitioned {
            alert.acknowledged = next.is_acknowledged();
            alert.acknowledged_at = Some(at);
        }

        Ok((alert.clone(), outcome))
    }

    async fn get(&self, id: AlertId) -> Result<Option<Alert>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.alerts.iter().find(|a| a.id == id).cloned())
    }

    async fn list_newest_first(&self) -> Result<Vec<Alert>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut alerts = tables.alerts.clone();
        alerts.sort_by(|a, b| {
            b.triggered_at
                .cmp(&a.triggered_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(alerts)
    }
}

#[async_trait]
impl StatsStore for MemoryStore {
    async fn system_stats(&self) -> Result<SystemStats, RepositoryError> {
        let tables = self.tables.read().await;
        let total = tables.alerts.len();
        let open = tables.alerts.iter().filter(|a| !a.acknowledged).count();

        // Persons, cameras and detections live in the surveillance pipeline's
        // tables, which this store does not model.
        Ok(SystemStats {
            alerts: i64::try_from(total).unwrap_or(i64::MAX),
            unacknowledged_alerts: i64::try_from(open).unwrap_or(i64::MAX),
            ..SystemStats::default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use watchpost_core::CameraId;

    use super::*;

    fn new_user(email: &str, is_admin: bool) -> NewUser {
        NewUser {
            email: Email::parse(email).unwrap(),
            secret_hash: "hash".to_owned(),
            is_admin,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email_any_case() {
        let store = MemoryStore::new();
        UserStore::insert(&store, new_user("guard@site.test", false))
            .await
            .unwrap();

        let err = UserStore::insert(&store, new_user("GUARD@site.test", true))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_insert_if_empty_only_seeds_once() {
        let store = MemoryStore::new();
        assert!(
            store
                .insert_if_empty(new_user("a@site.test", true))
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            store
                .insert_if_empty(new_user("b@site.test", true))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(UserStore::list_newest_first(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_refuses_last_admin() {
        let store = MemoryStore::new();
        let admin = UserStore::insert(&store, new_user("admin@site.test", true))
            .await
            .unwrap();

        let err = store.delete_guarding_last_admin(admin.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::LastAdmin));
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .delete_guarding_last_admin(UserId::new(99))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_concurrent_admin_deletes_keep_one_admin() {
        let store = Arc::new(MemoryStore::new());
        let a = UserStore::insert(store.as_ref(), new_user("a@site.test", true))
            .await
            .unwrap();
        let b = UserStore::insert(store.as_ref(), new_user("b@site.test", true))
            .await
            .unwrap();

        let (ra, rb) = tokio::join!(
            {
                let store = Arc::clone(&store);
                async move { store.delete_guarding_last_admin(a.id).await }
            },
            {
                let store = Arc::clone(&store);
                async move { store.delete_guarding_last_admin(b.id).await }
            }
        );

        assert_eq!(usize::from(ra.is_ok()) + usize::from(rb.is_ok()), 1);
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_acknowledge_is_idempotent() {
        let store = MemoryStore::new();
        let alert = AlertStore::insert(
            &store,
            NewAlert {
                person_id: None,
                camera_id: CameraId::new(3),
            },
        )
        .await
        .unwrap();

        let first_at = Utc::now();
        let (acked, outcome) = store.acknowledge(alert.id, first_at).await.unwrap();
        assert_eq!(outcome, Acknowledgment::Transitioned);
        assert!(acked.acknowledged);

        let (again, outcome) = store.acknowledge(alert.id, Utc::now()).await.unwrap();
        assert_eq!(outcome, Acknowledgment::AlreadyAcknowledged);
        assert_eq!(again.acknowledged_at, Some(first_at));
    }

    #[tokio::test]
    async fn test_stats_count_open_alerts() {
        let store = MemoryStore::new();
        for camera in 1..=3 {
            AlertStore::insert(
                &store,
                NewAlert {
                    person_id: None,
                    camera_id: CameraId::new(camera),
                },
            )
            .await
            .unwrap();
        }
        store.acknowledge(AlertId::new(1), Utc::now()).await.unwrap();

        let stats = store.system_stats().await.unwrap();
        assert_eq!(stats.alerts, 3);
        assert_eq!(stats.unacknowledged_alerts, 2);
    }
}
