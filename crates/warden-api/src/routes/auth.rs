//! Authentication routes

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderName, header::AUTHORIZATION},
    routing::{get, post},
};
use tracing::{debug, info};
use warden_auth::BEARER_PREFIX;

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{LoginRequest, TokenResponse};
use super::validation::{validate_password, validate_username};

/// GET /api/hello
async fn hello() -> &'static str {
    "hello"
}

/// POST /api/authenticate
///
/// Exchanges credentials for a token, returned both in the body and in the
/// `Authorization` response header.
async fn authenticate(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<([(HeaderName, String); 1], Json<TokenResponse>), ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;

    debug!("Login attempt for user: {}", request.username);

    let identity = state
        .verifier
        .authenticate(&request.username, &request.password)
        .await?;

    let token = state.codec.issue(&identity)?;

    info!("User {} logged in successfully", identity.subject());

    Ok((
        [(AUTHORIZATION, format!("{}{}", BEARER_PREFIX, token))],
        Json(TokenResponse {
            token,
            expires_in: state.codec.validity().num_seconds(),
        }),
    ))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/hello", get(hello))
        .route("/api/authenticate", post(authenticate))
}
