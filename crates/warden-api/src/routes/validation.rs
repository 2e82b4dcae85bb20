//! Input validation shared by the auth and user routes

use crate::error::ApiError;

const MIN_USERNAME_LENGTH: usize = 3;
const MAX_USERNAME_LENGTH: usize = 50;
const MIN_PASSWORD_LENGTH: usize = 3;
/// Upper bound keeps Argon2 work per request bounded
const MAX_PASSWORD_LENGTH: usize = 100;
const MIN_NICKNAME_LENGTH: usize = 3;
const MAX_NICKNAME_LENGTH: usize = 50;

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ApiError::BadRequest(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}

/// Validate username format and length
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    check_length("Username", username, MIN_USERNAME_LENGTH, MAX_USERNAME_LENGTH)?;
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens"
                .to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    check_length("Password", password, MIN_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH)
}

pub fn validate_nickname(nickname: &str) -> Result<(), ApiError> {
    check_length("Nickname", nickname, MIN_NICKNAME_LENGTH, MAX_NICKNAME_LENGTH)
}
