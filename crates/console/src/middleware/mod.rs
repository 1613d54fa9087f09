//! HTTP middleware for the console.
//!
//! - `auth` - Authorization gate and the extractors that apply it
//! - `session` - Browser cookie session layer (carries the session token)

pub mod auth;
pub mod session;

pub use auth::{
    GateDecision, PresentedToken, RequireAdmin, RequireOperator, Sensitivity, authorize,
    clear_session_token, set_session_token,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
