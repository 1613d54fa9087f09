//! Integration tests for Watchpost.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no external services)
//! cargo test -p watchpost-integration-tests
//!
//! # Include the PostgreSQL-backed tests
//! WATCHPOST_DATABASE_URL=postgres://... cargo test -p watchpost-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `console_auth` - Login, logout, sessions, bootstrap
//! - `console_users` - Admin-only operator management, last-admin guard
//! - `console_alerts` - Alert lifecycle and dashboard
//! - `pg_repositories` - `PostgreSQL` store semantics (ignored by default)
//!
//! [`TestApp`] drives the real router in-process with `tower::ServiceExt::oneshot`
//! over the in-memory stores.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use watchpost_console::services::HashingParams;
use watchpost_console::{AppState, ConsoleConfig, routes};

/// Email of the seeded admin.
pub const ADMIN_EMAIL: &str = "admin@watchpost.local";

/// Secret of the seeded admin.
pub const ADMIN_SECRET: &str = "watchpost-admin";

/// Smallest Argon2 work factor, so tests do not spend their time hashing.
#[must_use]
pub fn test_config() -> ConsoleConfig {
    ConsoleConfig {
        hashing: HashingParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        },
        ..ConsoleConfig::in_memory()
    }
}

/// A response with its body parsed as JSON (`Value::Null` if it was not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `Location` header, if any.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `name=value` of the first `Set-Cookie` header, if any.
    #[must_use]
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_owned)
    }
}

/// The console router over a fresh in-memory store.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Fresh app with the bootstrap admin seeded.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    /// Fresh app with the bootstrap admin seeded, using `config`.
    pub async fn with_config(config: ConsoleConfig) -> Self {
        Self::with_state(AppState::in_memory(config).unwrap()).await
    }

    /// App over an already-built state, with the bootstrap admin seeded.
    pub async fn with_state(state: AppState) -> Self {
        state.bootstrap().await.unwrap();
        let router = routes::app(state.clone());
        Self { state, router }
    }

    /// Send a request. `auth` is a bearer token.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = auth {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.dispatch(request).await
    }

    /// Send an already-built request.
    pub async fn dispatch(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` with an optional bearer token.
    pub async fn get(&self, uri: &str, auth: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, auth, None).await
    }

    /// `POST` JSON with an optional bearer token.
    pub async fn post(&self, uri: &str, auth: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, auth, Some(body)).await
    }

    /// Log in through the API and return the bearer token.
    pub async fn login(&self, email: &str, secret: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                serde_json::json!({ "email": email, "secret": secret }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {response:?}");
        response.body["session_token"].as_str().unwrap().to_owned()
    }

    /// Token for the seeded admin.
    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_SECRET).await
    }

    /// Create an operator as `admin_token` and return its ID.
    pub async fn create_user(
        &self,
        admin_token: &str,
        email: &str,
        secret: &str,
        is_admin: bool,
    ) -> i64 {
        let response = self
            .post(
                "/api/users",
                Some(admin_token),
                serde_json::json!({ "email": email, "secret": secret, "is_admin": is_admin }),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "create failed: {response:?}"
        );
        response.body["user_id"].as_i64().unwrap()
    }

    /// Raise an alert through the producer endpoint and return its ID.
    pub async fn raise_alert(&self, camera_id: i32, person_id: Option<i32>) -> i64 {
        let response = self
            .post(
                "/internal/alerts",
                None,
                serde_json::json!({ "camera_id": camera_id, "person_id": person_id }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        response.body["alert_id"].as_i64().unwrap()
    }
}
