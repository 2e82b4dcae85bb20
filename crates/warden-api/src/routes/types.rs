//! Request/Response DTOs

use serde::{Deserialize, Serialize};
use warden_db::User;

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response; the token is also sent in the `Authorization` header
#[derive(Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub expires_in: i64,
}

// ==================== User Types ====================

/// Signup request
#[derive(Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub nickname: String,
}

/// User response (without password)
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserResponse {
    pub username: String,
    pub nickname: String,
    pub authorities: Vec<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            nickname: user.nickname,
            authorities: user.authorities,
        }
    }
}
