//! Handoff audit records
//!
//! Each cross-agent transfer leaves one append-only row: who handed off
//! to whom, the task summary, and a truncated snippet of the carried
//! context. The snippet is an audit artifact; the receiving agent gets
//! the full context through its prompt, never from this table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use super::now_millis;

/// One recorded agent-to-agent transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub id: i64,
    pub conversation_id: i64,
    pub from_role: String,
    pub to_role: String,
    pub task_summary: String,
    pub context_snippet: String,
    pub created_at: i64,
}

/// Repository for handoff audit rows
pub struct HandoffRepository {
    pool: SqlitePool,
}

impl HandoffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append a handoff record. The caller truncates the snippet.
    pub async fn append(
        &self,
        conversation_id: i64,
        from_role: &str,
        to_role: &str,
        task_summary: &str,
        context_snippet: &str,
    ) -> Result<HandoffRecord> {
        let now = now_millis();

        let result = sqlx::query(
            "INSERT INTO handoff_records \
             (conversation_id, from_role, to_role, task_summary, context_snippet, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(from_role)
        .bind(to_role)
        .bind(task_summary)
        .bind(context_snippet)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to record handoff")?;

        Ok(HandoffRecord {
            id: result.last_insert_rowid(),
            conversation_id,
            from_role: from_role.to_string(),
            to_role: to_role.to_string(),
            task_summary: task_summary.to_string(),
            context_snippet: context_snippet.to_string(),
            created_at: now,
        })
    }

    /// All handoffs in one conversation, oldest first.
    pub async fn list_for_conversation(&self, conversation_id: i64) -> Result<Vec<HandoffRecord>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, from_role, to_role, task_summary, context_snippet, \
             created_at \
             FROM handoff_records \
             WHERE conversation_id = ? \
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list handoffs")?;

        Ok(rows
            .into_iter()
            .map(|r| HandoffRecord {
                id: r.get("id"),
                conversation_id: r.get("conversation_id"),
                from_role: r.get("from_role"),
                to_role: r.get("to_role"),
                task_summary: r.get("task_summary"),
                context_snippet: r.get("context_snippet"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
