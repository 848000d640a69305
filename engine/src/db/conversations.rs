//! Conversation persistence
//!
//! Conversations group turns; each turn records who spoke (user,
//! assistant, system), optionally which role produced it and which
//! model served it. Retrieval returns the most recent window in
//! chronological order so callers can replay it directly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use super::now_millis;

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::System => "system",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "assistant" => TurnRole::Assistant,
            "system" => TurnRole::System,
            _ => TurnRole::User,
        }
    }
}

/// Conversation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub project_id: Option<i64>,
    pub title: String,
    pub created_at: i64,
}

/// One stored turn of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub conversation_id: i64,
    pub role: TurnRole,
    pub content: String,
    /// Agent role that produced an assistant turn, if any.
    pub role_key: Option<String>,
    /// "backend:variant" label of the model that served the turn.
    pub model_used: Option<String>,
    pub created_at: i64,
}

/// Repository for conversations and their turns
pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a new conversation, optionally attached to a project.
    pub async fn create_conversation(
        &self,
        project_id: Option<i64>,
        title: &str,
    ) -> Result<Conversation> {
        let now = now_millis();

        let result = sqlx::query(
            "INSERT INTO conversations (project_id, title, created_at) VALUES (?, ?, ?)",
        )
        .bind(project_id)
        .bind(title)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create conversation")?;

        Ok(Conversation {
            id: result.last_insert_rowid(),
            project_id,
            title: title.to_string(),
            created_at: now,
        })
    }

    /// Get a conversation by id
    pub async fn get_conversation(&self, id: i64) -> Result<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, project_id, title, created_at FROM conversations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch conversation")?;

        Ok(row.map(|r| Conversation {
            id: r.get("id"),
            project_id: r.get("project_id"),
            title: r.get("title"),
            created_at: r.get("created_at"),
        }))
    }

    /// Append one turn to a conversation.
    pub async fn add_turn(
        &self,
        conversation_id: i64,
        role: TurnRole,
        content: &str,
        role_key: Option<&str>,
        model_used: Option<&str>,
    ) -> Result<ConversationTurn> {
        let now = now_millis();

        let result = sqlx::query(
            "INSERT INTO conversation_turns \
             (conversation_id, role, content, role_key, model_used, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(role.as_str())
        .bind(content)
        .bind(role_key)
        .bind(model_used)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to add conversation turn")?;

        Ok(ConversationTurn {
            id: result.last_insert_rowid(),
            conversation_id,
            role,
            content: content.to_string(),
            role_key: role_key.map(String::from),
            model_used: model_used.map(String::from),
            created_at: now,
        })
    }

    /// The last `limit` turns, oldest first.
    ///
    /// Fetches newest-first so LIMIT keeps the recent window, then
    /// reverses into chronological order.
    pub async fn recent_turns(
        &self,
        conversation_id: i64,
        limit: i64,
    ) -> Result<Vec<ConversationTurn>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, role, content, role_key, model_used, created_at \
             FROM conversation_turns \
             WHERE conversation_id = ? \
             ORDER BY created_at DESC, id DESC \
             LIMIT ?",
        )
        .bind(conversation_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch conversation turns")?;

        let mut turns: Vec<ConversationTurn> = rows
            .into_iter()
            .map(|r| ConversationTurn {
                id: r.get("id"),
                conversation_id: r.get("conversation_id"),
                role: TurnRole::from_db(r.get::<String, _>("role").as_str()),
                content: r.get("content"),
                role_key: r.get("role_key"),
                model_used: r.get("model_used"),
                created_at: r.get("created_at"),
            })
            .collect();
        turns.reverse();
        Ok(turns)
    }
}
