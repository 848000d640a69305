//! Cross-agent handoff protocol
//!
//! A handoff moves a task from one role to another inside the same
//! conversation. The audit row stores only a truncated context snippet;
//! the receiving agent gets the full context embedded in its prompt.

use super::core::{Agent, RunOptions};
use super::{load_instructions, RoleKey};
use crate::context::ContextAssembler;
use crate::db::{ConversationRepository, HandoffRepository};
use crate::error::Result;
use crate::llm::router::Router;
use std::path::PathBuf;
use std::sync::Arc;

/// Length of the context snippet kept in the audit record.
const SNIPPET_CHARS: usize = 200;

pub struct HandoffCoordinator {
    handoffs: HandoffRepository,
    router: Arc<Router>,
    assembler: Arc<ContextAssembler>,
    conversations: Arc<ConversationRepository>,
    prompt_dir: PathBuf,
}

impl HandoffCoordinator {
    pub fn new(
        handoffs: HandoffRepository,
        router: Arc<Router>,
        assembler: Arc<ContextAssembler>,
        conversations: Arc<ConversationRepository>,
        prompt_dir: PathBuf,
    ) -> Self {
        Self {
            handoffs,
            router,
            assembler,
            conversations,
            prompt_dir,
        }
    }

    /// Transfer a task to another role and return its response verbatim.
    ///
    /// The audit record is written before the target runs, so a failed
    /// invocation still leaves a trace of the attempted transfer.
    pub async fn transfer(
        &self,
        conversation_id: i64,
        from: RoleKey,
        to_key: &str,
        task_summary: &str,
        context: &str,
        project_id: Option<i64>,
    ) -> Result<String> {
        let to: RoleKey = to_key.parse()?;

        let snippet = truncate_chars(context, SNIPPET_CHARS);
        self.handoffs
            .append(
                conversation_id,
                from.as_str(),
                to.as_str(),
                task_summary,
                &snippet,
            )
            .await?;

        tracing::info!(from = %from, to = %to, conversation_id, "Handing off task");

        let prompt = format!(
            "[INCOMING HANDOFF FROM {}]\nTASK: {}\n\nCONTEXT:\n{}\n\n\
             Please execute this task based on your role.",
            from.as_str().to_uppercase(),
            task_summary,
            context
        );

        let target = Agent::new(
            to,
            load_instructions(to, &self.prompt_dir),
            Arc::clone(&self.router),
            Arc::clone(&self.assembler),
            Arc::clone(&self.conversations),
        );

        let options = RunOptions {
            project_id,
            conversation_id: Some(conversation_id),
            ..RunOptions::default()
        };
        let response = target.run(&prompt, options).await?;
        Ok(response.text)
    }
}

/// Truncate on a character boundary, never mid-codepoint.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("short", 200), "short");
    }

    #[test]
    fn test_truncate_long_text_to_limit() {
        let long = "x".repeat(500);
        assert_eq!(truncate_chars(&long, 200).chars().count(), 200);
    }

    #[test]
    fn test_truncate_respects_multibyte_boundaries() {
        let text = "é".repeat(250);
        let snippet = truncate_chars(&text, 200);
        assert_eq!(snippet.chars().count(), 200);
        assert!(snippet.chars().all(|c| c == 'é'));
    }
}
