//! Project Memory Repository
//!
//! Long-term storage of project context (requirements, decisions, notes),
//! weighted by importance and timestamped. Entries are append-only and
//! belong to exactly one project; deleting the project removes them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use super::now_millis;

/// A persisted note of project context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryEntry {
    pub id: i64,
    pub project_id: i64,
    pub category: String,
    pub content: String,
    pub importance: i64,
    pub created_at: i64,
}

/// Repository for project memory entries
pub struct MemoryRepository {
    pool: SqlitePool,
}

impl MemoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a new memory entry and return it.
    ///
    /// `importance` follows a 1-10 convention but is stored verbatim;
    /// out-of-range values are accepted as-is.
    pub async fn add_entry(
        &self,
        project_id: i64,
        category: &str,
        content: &str,
        importance: i64,
    ) -> Result<MemoryEntry> {
        let now = now_millis();

        let result = sqlx::query(
            "INSERT INTO memory_entries (project_id, category, content, importance, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(category)
        .bind(content)
        .bind(importance)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to add memory entry")?;

        Ok(MemoryEntry {
            id: result.last_insert_rowid(),
            project_id,
            category: category.to_string(),
            content: content.to_string(),
            importance,
            created_at: now,
        })
    }

    /// High-importance entries (core decisions), importance descending.
    pub async fn get_important(
        &self,
        project_id: i64,
        min_importance: i64,
        limit: i64,
    ) -> Result<Vec<MemoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, project_id, category, content, importance, created_at \
             FROM memory_entries \
             WHERE project_id = ? AND importance >= ? \
             ORDER BY importance DESC, created_at DESC \
             LIMIT ?",
        )
        .bind(project_id)
        .bind(min_importance)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch important memory entries")?;

        Ok(rows.into_iter().map(entry_from_row).collect())
    }

    /// Most recent entries, creation descending.
    pub async fn get_recent(&self, project_id: i64, limit: i64) -> Result<Vec<MemoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, project_id, category, content, importance, created_at \
             FROM memory_entries \
             WHERE project_id = ? \
             ORDER BY created_at DESC, id DESC \
             LIMIT ?",
        )
        .bind(project_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch recent memory entries")?;

        Ok(rows.into_iter().map(entry_from_row).collect())
    }
}

fn entry_from_row(r: sqlx::sqlite::SqliteRow) -> MemoryEntry {
    MemoryEntry {
        id: r.get("id"),
        project_id: r.get("project_id"),
        category: r.get("category"),
        content: r.get("content"),
        importance: r.get("importance"),
        created_at: r.get("created_at"),
    }
}
