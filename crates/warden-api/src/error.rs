//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] warden_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] warden_auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            ApiError::Database(e) => match e {
                warden_db::DbError::Duplicate(msg) => {
                    (StatusCode::CONFLICT, "CONFLICT", msg.clone())
                }
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "Internal error".to_string(),
                ),
            },
            ApiError::Auth(e) => (e.status_code(), "AUTH_ERROR", e.public_message().to_string()),
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = axum::Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_auth::{AuthError, TokenError};
    use warden_db::DbError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Auth(AuthError::Unauthenticated), StatusCode::UNAUTHORIZED),
            (ApiError::Auth(AuthError::Forbidden), StatusCode::FORBIDDEN),
            (
                ApiError::Auth(AuthError::Token(TokenError::Expired)),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Database(DbError::Duplicate("bob".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Database(DbError::Connection(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
