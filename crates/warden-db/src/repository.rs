//! Database repository implementation

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbError;
use crate::models::BUILTIN_AUTHORITIES;

mod users;

/// Database connection and operations
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        info!("Connecting to database: {}", database_url);

        let pool = SqlitePool::connect(database_url).await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    /// Get the underlying pool for advanced usage
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DbError> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                nickname TEXT NOT NULL,
                activated INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS authority (
                authority_name TEXT PRIMARY KEY
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_authority (
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                authority_name TEXT NOT NULL REFERENCES authority(authority_name),
                PRIMARY KEY (user_id, authority_name)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for name in BUILTIN_AUTHORITIES {
            sqlx::query("INSERT OR IGNORE INTO authority (authority_name) VALUES (?)")
                .bind(name)
                .execute(&self.pool)
                .await?;
        }

        info!("Database migrations completed");
        Ok(())
    }
}
