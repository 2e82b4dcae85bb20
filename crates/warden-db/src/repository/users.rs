//! User and authority operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user together with its authorities
    ///
    /// Authorities that do not exist yet are created on the fly. A taken
    /// username is reported as [`DbError::Duplicate`], also when two inserts
    /// race for it.
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        // The user row is the first write so the transaction takes the write
        // lock before anything else and the UNIQUE constraint decides races.
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, nickname, activated, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .bind(user.activated)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| duplicate_or(e, &user.username))?;

        let id: i64 = result.get("id");

        let mut authorities = user.authorities.clone();
        authorities.sort();
        authorities.dedup();

        for name in &authorities {
            sqlx::query("INSERT OR IGNORE INTO authority (authority_name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO user_authority (user_id, authority_name) VALUES (?, ?)")
                .bind(id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            nickname: user.nickname,
            activated: user.activated,
            authorities,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user and its authorities by username
    pub async fn get_user_with_authorities(&self, username: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, password_hash, nickname, activated, created_at, updated_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut user = User::try_from(&row)?;
        user.authorities = self.get_authorities(user.id).await?;
        Ok(Some(user))
    }

    /// Authority names granted to a user, sorted
    async fn get_authorities(&self, user_id: i64) -> Result<Vec<String>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT authority_name
            FROM user_authority
            WHERE user_id = ?
            ORDER BY authority_name
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| row.try_get("authority_name").map_err(DbError::from))
            .collect()
    }

    /// Check if any users exist
    pub async fn has_users(&self) -> Result<bool, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(self.pool())
            .await?;
        let count: i64 = result.get("count");
        Ok(count > 0)
    }
}

fn duplicate_or(err: sqlx::Error, username: &str) -> DbError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            DbError::Duplicate(format!("User '{}' already exists", username))
        }
        other => DbError::Connection(other),
    }
}
