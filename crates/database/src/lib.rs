//! SQLite persistence layer for the WhatsApp tutor bot.
//!
//! This crate provides async database operations for student profiles and
//! session credential records using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{models::StudentRow, student, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:tutor.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let row = StudentRow {
//!         jid: "5511999990000@s.whatsapp.net".to_string(),
//!         display_name: Some("Ana".to_string()),
//!         level: "Beginner".to_string(),
//!         xp: 0,
//!         mode: "chat".to_string(),
//!         history: "[]".to_string(),
//!     };
//!     student::save_student(db.pool(), &row).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod auth_record;
pub mod error;
pub mod models;
pub mod student;

pub use error::{DatabaseError, Result};
pub use models::{AuthRecord, StudentRow};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_student_roundtrip() {
        let db = test_db().await;

        // Unseen JID
        let missing = student::find_student(db.pool(), "x@s.whatsapp.net")
            .await
            .unwrap();
        assert!(missing.is_none());

        // Create
        let row = StudentRow {
            jid: "x@s.whatsapp.net".to_string(),
            display_name: None,
            level: "Beginner".to_string(),
            xp: 0,
            mode: "chat".to_string(),
            history: "[]".to_string(),
        };
        student::save_student(db.pool(), &row).await.unwrap();

        // Read back
        let fetched = student::find_student(db.pool(), &row.jid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, row);

        // Upsert
        let updated = StudentRow {
            xp: 11,
            level: "Beginner".to_string(),
            history: r#"[{"role":"user","content":"hi"}]"#.to_string(),
            ..row.clone()
        };
        student::save_student(db.pool(), &updated).await.unwrap();
        let fetched = student::find_student(db.pool(), &row.jid)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.xp, 11);
        assert_eq!(student::count_students(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_auth_record_crud() {
        let db = test_db().await;

        assert!(auth_record::get(db.pool(), "creds").await.unwrap().is_none());

        auth_record::put(db.pool(), "creds", r#"{"a":1}"#).await.unwrap();
        auth_record::put(db.pool(), "pre-key-1", r#"{"b":2}"#)
            .await
            .unwrap();
        auth_record::put(db.pool(), "creds", r#"{"a":2}"#).await.unwrap();

        assert_eq!(
            auth_record::get(db.pool(), "creds").await.unwrap().as_deref(),
            Some(r#"{"a":2}"#)
        );
        assert_eq!(auth_record::count(db.pool()).await.unwrap(), 2);

        auth_record::delete(db.pool(), "pre-key-1").await.unwrap();
        assert!(auth_record::get(db.pool(), "pre-key-1")
            .await
            .unwrap()
            .is_none());

        // Deleting an absent record is a no-op.
        auth_record::delete(db.pool(), "pre-key-1").await.unwrap();

        auth_record::delete_all(db.pool()).await.unwrap();
        assert_eq!(auth_record::count(db.pool()).await.unwrap(), 0);
    }
}
