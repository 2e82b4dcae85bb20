//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Why a token could not be turned back into an identity
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Unsupported token type")]
    UnsupportedType,
}

impl TokenError {
    /// Label used for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::Expired => "expired",
            TokenError::UnsupportedType => "unsupported_type",
        }
    }
}

/// Signing secret could not be turned into a key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Signing secret is not valid base64")]
    InvalidBase64,

    #[error("Signing secret is {len} bytes, at least {min} are required")]
    TooShort { len: usize, min: usize },
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User is not activated")]
    UserNotActivated,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Token validity must be positive and keep the expiry representable")]
    InvalidValidity,

    #[error("Role {0:?} cannot be carried in a token")]
    InvalidRole(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Database error: {0}")]
    Database(#[from] warden_db::DbError),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials
            | AuthError::UserNotActivated
            | AuthError::Unauthenticated
            | AuthError::Token(_) => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InvalidValidity
            | AuthError::InvalidRole(_)
            | AuthError::Key(_)
            | AuthError::PasswordHash(_)
            | AuthError::Jwt(_)
            | AuthError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; never carries token, key or backend details
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid credentials",
            AuthError::UserNotActivated => "User is not activated",
            AuthError::Unauthenticated => "Authentication required",
            AuthError::Token(_) => "Invalid token",
            AuthError::Forbidden => "Insufficient permissions",
            _ => "Internal error",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Authentication failure: {}", self);
        }

        let body = axum::Json(json!({
            "error": self.public_message()
        }));

        (status, body).into_response()
    }
}
