/// Project persistence operations
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};

use super::now_millis;

/// Project record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
}

/// Repository for project rows
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new project
    pub async fn create(&self, name: &str) -> Result<Project> {
        let now = now_millis();

        let result = sqlx::query("INSERT INTO projects (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to create project")?;

        Ok(Project {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
        })
    }

    /// Get a project by id
    pub async fn get(&self, id: i64) -> Result<Option<Project>> {
        let row = sqlx::query("SELECT id, name, created_at FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch project")?;

        Ok(row.map(|r| Project {
            id: r.get("id"),
            name: r.get("name"),
            created_at: r.get("created_at"),
        }))
    }

    /// List all projects, newest first
    pub async fn list(&self) -> Result<Vec<Project>> {
        let rows =
            sqlx::query("SELECT id, name, created_at FROM projects ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list projects")?;

        Ok(rows
            .into_iter()
            .map(|r| Project {
                id: r.get("id"),
                name: r.get("name"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    /// Delete a project. Its memory entries go with it (cascade).
    pub async fn delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected())
    }
}
