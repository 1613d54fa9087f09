//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Store reachability
//!
//! # Auth
//! POST   /api/auth/login                - JSON login, returns bearer token
//! POST   /api/auth/logout               - End session (idempotent)
//! GET    /auth/login                    - Login landing for browsers
//! POST   /auth/login                    - Form login, token kept in cookie session
//! POST   /auth/logout                   - Form logout
//!
//! # Operator
//! GET    /                              - Dashboard (browsers redirected to login)
//! GET    /api/dashboard                 - Dashboard
//! GET    /api/session                   - Current identity
//! POST   /api/ai-mode/toggle            - Flip the AI mode flag
//! GET    /api/alerts                    - Alerts, newest first
//! GET    /api/alerts/{id}               - One alert
//! POST   /api/alerts/{id}/acknowledge   - Acknowledge (idempotent)
//!
//! # Admin only
//! GET    /api/users                     - List operators
//! POST   /api/users                     - Create operator
//! DELETE /api/users/{id}                - Delete operator (never the last admin)
//!
//! # Producer
//! POST   /internal/alerts               - Raise an alert
//! ```

pub mod alerts;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod internal;
pub mod users;

use axum::Router;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Every route, without state or layers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(alerts::router())
        .merge(users::router())
        .merge(internal::router())
}

/// The routed application with its cookie session layer and state applied.
///
/// Tracing and Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes().layer(session_layer).with_state(state)
}
