//! `PostgreSQL` store tests.
//!
//! These need a migrated database:
//!
//! ```bash
//! WATCHPOST_DATABASE_URL=postgres://... cargo test -p watchpost-integration-tests -- --ignored
//! ```

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use secrecy::SecretString;
use sqlx::PgPool;

use watchpost_console::db::{
    AlertStore, PgAlertRepository, PgUserRepository, RepositoryError, UserStore, create_pool,
};
use watchpost_console::services::{
    AlertService, CredentialError, CredentialService, HashingParams, SecretHasher,
};
use watchpost_console::models::{Identity, NewAlert};
use watchpost_core::{Acknowledgment, CameraId, Email, Role, UserId};

async fn pool() -> PgPool {
    let url = std::env::var("WATCHPOST_DATABASE_URL")
        .expect("WATCHPOST_DATABASE_URL must be set for PostgreSQL tests");
    let pool = create_pool(&SecretString::from(url)).await.unwrap();
    sqlx::migrate!("../console/migrations")
        .run(&pool)
        .await
        .unwrap();
    pool
}

/// Email no other run has used.
fn unique_email(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}-{nanos}@pg.test")
}

fn credentials(pool: &PgPool) -> CredentialService {
    let hasher = SecretHasher::new(HashingParams {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    })
    .unwrap();
    CredentialService::new(Arc::new(PgUserRepository::new(pool.clone())), hasher)
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (WATCHPOST_DATABASE_URL)"]
async fn test_register_and_verify_ignore_email_case() {
    let pool = pool().await;
    let service = credentials(&pool);
    let email = unique_email("Guard");

    let user = service
        .register(&email, "pg-guard-secret", false)
        .await
        .unwrap();
    assert_eq!(user.email.as_str(), email.to_lowercase());

    let verified = service
        .verify(&email.to_uppercase(), "pg-guard-secret")
        .await
        .unwrap();
    assert_eq!(verified.map(|u| u.id), Some(user.id));

    let err = service
        .register(&email.to_uppercase(), "pg-guard-secret", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::DuplicateIdentity));

    service.delete(user.id).await.unwrap();
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (WATCHPOST_DATABASE_URL)"]
async fn test_extra_admin_can_be_deleted() {
    let pool = pool().await;
    let service = credentials(&pool);
    let repo = PgUserRepository::new(pool.clone());

    let admin = service
        .register(&unique_email("admin"), "pg-admin-secret", true)
        .await
        .unwrap();
    let before = repo.count_admins().await.unwrap();
    assert!(before >= 1);

    if before > 1 {
        repo.delete_guarding_last_admin(admin.id).await.unwrap();
        assert_eq!(repo.count_admins().await.unwrap(), before - 1);
    } else {
        let err = repo.delete_guarding_last_admin(admin.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::LastAdmin));
    }
}

// ============================================================================
// Alerts
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (WATCHPOST_DATABASE_URL)"]
async fn test_acknowledge_is_idempotent() {
    let pool = pool().await;
    let service = AlertService::new(Arc::new(PgAlertRepository::new(pool)));

    let alert = service.raise(None, CameraId::new(3)).await.unwrap();
    assert!(!alert.acknowledged);

    let identity = Identity {
        user_id: UserId::new(1),
        email: Email::parse("admin@pg.test").unwrap(),
        role: Role::Admin,
    };

    let first = service.acknowledge(alert.id, &identity).await.unwrap();
    let second = service.acknowledge(alert.id, &identity).await.unwrap();

    assert!(first.acknowledged);
    assert_eq!(first.acknowledged_at, second.acknowledged_at);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (WATCHPOST_DATABASE_URL)"]
async fn test_concurrent_acknowledgments_transition_once() {
    let pool = pool().await;
    let repo = Arc::new(PgAlertRepository::new(pool));
    let alert = repo
        .insert(NewAlert {
            person_id: None,
            camera_id: CameraId::new(9),
        })
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        repo.acknowledge(alert.id, Utc::now()),
        repo.acknowledge(alert.id, Utc::now())
    );
    let (a, outcome_a) = a.unwrap();
    let (b, outcome_b) = b.unwrap();

    let transitions = [outcome_a, outcome_b]
        .iter()
        .filter(|o| **o == Acknowledgment::Transitioned)
        .count();
    assert_eq!(transitions, 1);
    assert_eq!(a.acknowledged_at, b.acknowledged_at);
}
