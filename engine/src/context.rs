//! Context assembly
//!
//! Builds the system instruction an agent sends with every request:
//! role instructions, a formatted project memory block, optional task
//! artifacts, and a fixed trailer of behavior rules. Formatting is pure;
//! only the memory fetch touches the database.

use crate::config::MemoryConfig;
use crate::db::{MemoryEntry, MemoryRepository};
use crate::error::Result;
use std::collections::HashSet;

/// Non-negotiable rules appended to every assembled context.
const BEHAVIOR_RULES: &str = "\
MANDATORY BEHAVIOR RULES:
1. Never invent facts, APIs, file contents, or prior decisions. If you do not know, say so.
2. Give honest time and effort estimates. Do not inflate or understate them to please anyone.
3. State your confidence level when it is not high, and name what would raise it.";

/// Render memory entries into the project context block.
///
/// Critical entries come first, then recent ones with anything already
/// listed in the critical section removed. Returns an empty string when
/// there is nothing to show, so callers can skip the block entirely.
pub fn format_memory_block(critical: &[MemoryEntry], recent: &[MemoryEntry]) -> String {
    let mut seen: HashSet<i64> = critical.iter().map(|e| e.id).collect();
    let fresh_recent: Vec<&MemoryEntry> = recent
        .iter()
        .filter(|e| seen.insert(e.id))
        .collect();

    if critical.is_empty() && fresh_recent.is_empty() {
        return String::new();
    }

    let mut block = String::from("--- PROJECT CONTEXT ---\n");

    if !critical.is_empty() {
        block.push_str("\n[CRITICAL DECISIONS]\n");
        for entry in critical {
            block.push_str(&format_entry_line(entry));
        }
    }

    if !fresh_recent.is_empty() {
        block.push_str("\n[RECENT UPDATES]\n");
        for entry in fresh_recent {
            block.push_str(&format_entry_line(entry));
        }
    }

    block.push_str("\n-----------------------");
    block
}

fn format_entry_line(entry: &MemoryEntry) -> String {
    format!("- [{}] {}\n", entry.category.to_uppercase(), entry.content)
}

/// Assembles the full system instruction for one agent request.
pub struct ContextAssembler {
    memory: MemoryRepository,
    config: MemoryConfig,
}

impl ContextAssembler {
    pub fn new(memory: MemoryRepository, config: MemoryConfig) -> Self {
        Self { memory, config }
    }

    /// Build the system instruction.
    ///
    /// Without a project there is no memory block; the other sections
    /// are unaffected. Sections are joined with blank lines and empty
    /// sections are dropped rather than leaving gaps.
    pub async fn assemble(
        &self,
        role_instructions: &str,
        project_id: Option<i64>,
        artifacts: Option<&str>,
    ) -> Result<String> {
        let memory_block = match project_id {
            Some(id) => self.recall(id).await?,
            None => String::new(),
        };

        let mut sections: Vec<&str> = vec![role_instructions];
        if !memory_block.is_empty() {
            sections.push(&memory_block);
        }
        let artifacts_block;
        if let Some(text) = artifacts {
            if !text.trim().is_empty() {
                artifacts_block = format!("TASK ARTIFACTS:\n{}", text);
                sections.push(&artifacts_block);
            }
        }
        sections.push(BEHAVIOR_RULES);

        Ok(sections.join("\n\n"))
    }

    async fn recall(&self, project_id: i64) -> Result<String> {
        let critical = self
            .memory
            .get_important(
                project_id,
                self.config.critical_min_importance,
                self.config.critical_limit,
            )
            .await?;
        let recent = self
            .memory
            .get_recent(project_id, self.config.recent_limit)
            .await?;

        Ok(format_memory_block(&critical, &recent))
    }
}
