//! API routes

mod auth;
mod health;
pub mod metrics;
pub mod types;
mod users;
mod validation;

use axum::{Router, middleware::from_fn_with_state};
use std::sync::Arc;
use warden_auth::{AccessPolicy, Requirement, access_gate, auth_middleware};
use warden_db::{ROLE_ADMIN, ROLE_USER};

use crate::state::{AppState, MetricsHandle};

/// Route requirements; anything not listed needs an authenticated caller
pub fn access_policy() -> AccessPolicy {
    AccessPolicy::new(Requirement::Authenticated)
        .permit_all(&[
            "/api/hello",
            "/api/authenticate",
            "/api/signup",
            "/health",
            "/healthz",
        ])
        .route("/api/user", Requirement::any_role([ROLE_USER, ROLE_ADMIN]))
        .route("/api/user/{username}", Requirement::any_role([ROLE_ADMIN]))
}

/// Create the main router
///
/// Every API route passes the interceptor and then the gate; the metrics
/// endpoint is merged outside both.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let codec = state.codec.clone();
    let policy = Arc::new(access_policy());

    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .with_state(state)
        .layer(from_fn_with_state(policy, access_gate))
        .layer(from_fn_with_state(codec, auth_middleware));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
