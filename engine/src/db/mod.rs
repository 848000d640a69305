/// Database module for SQLite persistence
///
/// Provides the persistence contract the core needs: append message,
/// fetch recent messages, append/query memory entries, append handoff
/// records. Uses sqlx with parameterized queries and WAL mode for better
/// concurrency. Every append is its own atomic commit; no multi-statement
/// transaction spans the request pipeline.
use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::ConnectOptions;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub mod conversations;
pub mod handoffs;
pub mod memory;
pub mod projects;

// Re-export commonly used types
pub use conversations::{Conversation, ConversationRepository, ConversationTurn, TurnRole};
pub use handoffs::{HandoffRecord, HandoffRepository};
pub use memory::{MemoryEntry, MemoryRepository};
pub use projects::{Project, ProjectRepository};

/// Current wall-clock time in unix milliseconds.
///
/// Millisecond resolution keeps `created_at` ordering meaningful for
/// rows appended within the same second.
pub(crate) fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) the database at `db_path`.
    ///
    /// Enables WAL mode and foreign keys, then runs migrations. SQLite
    /// recovers uncommitted WAL state automatically on reopen, so no
    /// extra crash-recovery code is needed here.
    pub async fn new(db_path: &Path) -> Result<Self> {
        info!("Initializing database at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        let connection_string = format!("sqlite:{}", db_path.display());
        let options = SqliteConnectOptions::from_str(&connection_string)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            .disable_statement_logging();

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        debug!("Database connection established");

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations (idempotent raw SQL).
    async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::raw_sql(include_str!("../../migrations/001_initial.sql"))
            .execute(&self.pool)
            .await
            .context("Failed to execute migration 001_initial.sql")?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Flush the WAL to disk; call during graceful shutdown.
    pub async fn flush_wal(&self) -> Result<()> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await
            .context("Failed to flush WAL")?;
        Ok(())
    }

    /// Close the database connection, flushing the WAL first.
    pub async fn close(self) -> Result<()> {
        self.flush_wal().await?;
        self.pool.close().await;
        info!("Database connection closed");
        Ok(())
    }

    /// Create a project repository
    pub fn projects(&self) -> ProjectRepository {
        ProjectRepository::new(self.pool.clone())
    }

    /// Create a memory repository
    pub fn memory(&self) -> MemoryRepository {
        MemoryRepository::new(self.pool.clone())
    }

    /// Create a conversation repository
    pub fn conversations(&self) -> ConversationRepository {
        ConversationRepository::new(self.pool.clone())
    }

    /// Create a handoff repository
    pub fn handoffs(&self) -> HandoffRepository {
        HandoffRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("test.db");

        let db = Database::new(&db_path).await.expect("database opens");

        assert!(db_path.exists());

        let result = sqlx::query("SELECT 1").fetch_one(db.pool()).await;
        assert!(result.is_ok());

        db.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let temp_dir = TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("test.db");

        let db = Database::new(&db_path).await.expect("database opens");

        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .fetch_all(db.pool())
                .await
                .expect("table listing");

        assert!(tables.contains(&"projects".to_string()));
        assert!(tables.contains(&"memory_entries".to_string()));
        assert!(tables.contains(&"conversations".to_string()));
        assert!(tables.contains(&"conversation_turns".to_string()));
        assert!(tables.contains(&"handoff_records".to_string()));

        db.close().await.expect("close");
    }

    #[tokio::test]
    async fn test_wal_and_foreign_keys_enabled() {
        let temp_dir = TempDir::new().expect("temp dir");
        let db_path = temp_dir.path().join("test.db");

        let db = Database::new(&db_path).await.expect("database opens");

        let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .expect("journal mode");
        assert_eq!(journal_mode.to_lowercase(), "wal");

        let foreign_keys: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .expect("foreign keys");
        assert_eq!(foreign_keys, 1);

        db.close().await.expect("close");
    }
}
