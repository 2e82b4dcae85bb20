//! Warden REST API
//!
//! This crate provides the Axum-based HTTP API: login, signup and user
//! lookup endpoints, wired through the authentication interceptor and the
//! authorization gate from `warden-auth`.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{access_policy, create_router};
pub use state::{AppState, MetricsHandle};
