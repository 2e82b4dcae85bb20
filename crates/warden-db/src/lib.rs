//! Warden user store
//!
//! SQLite-backed persistence for users and their granted authorities,
//! accessed through sqlx. The authentication core only reads from it
//! while verifying credentials; signup writes through it.

pub mod error;
pub mod models;
pub mod repository;

pub use error::DbError;
pub use models::*;
pub use repository::Database;

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
