//! Shared agent request pipeline
//!
//! Every role runs the same pipeline: assemble the system instruction
//! (role + project memory + artifacts + behavior rules), route the
//! request through the model router, and persist the exchange when a
//! conversation is attached.

use super::RoleKey;
use crate::context::ContextAssembler;
use crate::db::{ConversationRepository, TurnRole};
use crate::error::Result;
use crate::llm::router::{RoutedResponse, Router};
use crate::llm::selector::{Complexity, TaskProfile, TaskType};
use std::sync::Arc;

/// Per-call knobs for an agent run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    /// Project whose memory is recalled into the context
    pub project_id: Option<i64>,
    /// Conversation to persist the exchange into
    pub conversation_id: Option<i64>,
    /// Routing profile; defaults to the role's own profile
    pub profile: Option<TaskProfile>,
    /// Explicit model override, bypassing the selector
    pub model_override: Option<&'a str>,
    /// Extra material (file contents, snippets) for the context
    pub artifacts: Option<&'a str>,
}

/// A role-specialized agent
pub struct Agent {
    role: RoleKey,
    instructions: String,
    router: Arc<Router>,
    assembler: Arc<ContextAssembler>,
    conversations: Arc<ConversationRepository>,
}

impl Agent {
    pub fn new(
        role: RoleKey,
        instructions: String,
        router: Arc<Router>,
        assembler: Arc<ContextAssembler>,
        conversations: Arc<ConversationRepository>,
    ) -> Self {
        Self {
            role,
            instructions,
            router,
            assembler,
            conversations,
        }
    }

    pub fn role(&self) -> RoleKey {
        self.role
    }

    /// The routing profile a role implies when the caller does not
    /// supply one.
    pub fn default_profile(&self) -> TaskProfile {
        match self.role {
            RoleKey::Coordinator => TaskProfile::default(),
            RoleKey::Analyst => {
                TaskProfile::new(TaskType::DeepAnalysis, Complexity::Medium, false)
            }
            RoleKey::Architect => {
                TaskProfile::new(TaskType::Architecture, Complexity::High, false)
            }
            RoleKey::Developer => TaskProfile::new(
                TaskType::ComplexProblemSolving,
                Complexity::Medium,
                false,
            ),
            RoleKey::Reviewer => {
                TaskProfile::new(TaskType::CodeReview, Complexity::Medium, false)
            }
        }
    }

    /// Run one request through the full pipeline.
    ///
    /// Persistence is best-effort ordering: the user turn is written
    /// before the model call so a failed invocation still leaves a
    /// record of what was asked.
    pub async fn run(&self, request: &str, options: RunOptions<'_>) -> Result<RoutedResponse> {
        let system_instruction = self
            .assembler
            .assemble(&self.instructions, options.project_id, options.artifacts)
            .await?;

        let profile = options.profile.unwrap_or_else(|| self.default_profile());

        if let Some(conversation_id) = options.conversation_id {
            self.conversations
                .add_turn(conversation_id, TurnRole::User, request, None, None)
                .await?;
        }

        tracing::info!(role = %self.role, task = ?profile.task_type, "Agent handling request");

        let response = self
            .router
            .process(request, &system_instruction, &profile, options.model_override)
            .await?;

        if let Some(conversation_id) = options.conversation_id {
            self.conversations
                .add_turn(
                    conversation_id,
                    TurnRole::Assistant,
                    &response.text,
                    Some(self.role.as_str()),
                    Some(&response.choice.label()),
                )
                .await?;
        }

        Ok(response)
    }
}
