//! User routes

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use tracing::{debug, info};
use warden_auth::{CurrentUser, hash_password};
use warden_db::{NewUser, ROLE_USER};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{SignupRequest, UserResponse};
use super::validation::{validate_nickname, validate_password, validate_username};

/// POST /api/signup
async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;
    validate_nickname(&request.nickname)?;

    debug!("Signing up user: {}", request.username);

    let password_hash = hash_password(&request.password)?;

    let user = state
        .db
        .insert_user(NewUser {
            username: request.username,
            password_hash,
            nickname: request.nickname,
            activated: true,
            authorities: vec![ROLE_USER.to_string()],
        })
        .await?;

    info!("Created user: {}", user.username);

    Ok(Json(user.into()))
}

/// GET /api/user
///
/// The caller's own record, looked up by the token subject.
async fn get_my_user(
    CurrentUser(identity): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_with_authorities(identity.subject())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", identity.subject())))?;

    Ok(Json(user.into()))
}

/// GET /api/user/{username}
async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_with_authorities(&username)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", username)))?;

    Ok(Json(user.into()))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/signup", post(signup))
        .route("/api/user", get(get_my_user))
        .route("/api/user/{username}", get(get_user))
}
