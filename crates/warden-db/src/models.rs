//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;

/// Authority granted to every account created through signup
pub const ROLE_USER: &str = "ROLE_USER";
/// Authority for administrative endpoints
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Authorities seeded by the migrations
pub const BUILTIN_AUTHORITIES: [&str; 2] = [ROLE_USER, ROLE_ADMIN];

/// User model, loaded together with its authorities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub nickname: String,
    pub activated: bool,
    /// Authority names, sorted
    pub authorities: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_authority(&self, name: &str) -> bool {
        self.authorities.iter().any(|a| a == name)
    }
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub nickname: String,
    pub activated: bool,
    pub authorities: Vec<String>,
}

fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

// ==================== TryFrom Implementations ====================

/// Builds a user from a `users` row; authorities are attached by the caller.
impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            nickname: row.try_get("nickname")?,
            activated: row.try_get("activated")?,
            authorities: Vec::new(),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}
