//! Agents
//!
//! The closed set of specialized roles, their instruction loading, and
//! the chat-vs-agent mode heuristic. `core` holds the shared request
//! pipeline, `specialists` the role-specific operations, `handoff` the
//! cross-agent transfer protocol.

use crate::error::EngineError;
use std::path::Path;
use std::str::FromStr;

pub mod core;
pub mod handoff;
pub mod specialists;

pub use self::core::Agent;
pub use self::handoff::HandoffCoordinator;

/// The closed set of agent roles.
///
/// Adding a role means adding a variant here plus its instruction
/// default; there is no runtime registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKey {
    Coordinator,
    Analyst,
    Architect,
    Developer,
    Reviewer,
}

impl RoleKey {
    pub const ALL: [RoleKey; 5] = [
        RoleKey::Coordinator,
        RoleKey::Analyst,
        RoleKey::Architect,
        RoleKey::Developer,
        RoleKey::Reviewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleKey::Coordinator => "coordinator",
            RoleKey::Analyst => "analyst",
            RoleKey::Architect => "architect",
            RoleKey::Developer => "developer",
            RoleKey::Reviewer => "reviewer",
        }
    }

    /// Valid role keys for error messages.
    pub fn valid_keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|r| r.as_str()).collect()
    }

    /// Short description shown by the `roles` command.
    pub fn description(&self) -> &'static str {
        match self {
            RoleKey::Coordinator => "Routes work, answers general questions, orchestrates handoffs",
            RoleKey::Analyst => "Breaks requests into requirements and user stories",
            RoleKey::Architect => "Produces system designs and architecture plans",
            RoleKey::Developer => "Implements features and writes code",
            RoleKey::Reviewer => "Reviews code and renders an approve/reject verdict",
        }
    }

    /// Built-in instructions used when no prompt file overrides them.
    pub(crate) fn default_instructions(&self) -> &'static str {
        match self {
            RoleKey::Coordinator => {
                "You are the coordinator agent. You route work to the right specialist, \
                 answer general questions directly, and keep multi-step efforts on track. \
                 Be concise and decisive."
            }
            RoleKey::Analyst => {
                "You are the analyst agent. You turn vague requests into concrete \
                 requirements, constraints, and user stories. Ask for missing information \
                 explicitly instead of guessing."
            }
            RoleKey::Architect => {
                "You are the architect agent. You produce system designs: components, \
                 data flow, technology choices, and tradeoffs. Prefer boring, proven \
                 structures over novelty."
            }
            RoleKey::Developer => {
                "You are the developer agent. You implement features as working code \
                 with clear structure and error handling. Put code in fenced blocks \
                 tagged with the language."
            }
            RoleKey::Reviewer => {
                "You are the reviewer agent. You review code for correctness, safety, \
                 and maintainability. End every review with a line containing exactly \
                 [APPROVE] or [REQUEST CHANGES]."
            }
        }
    }
}

impl FromStr for RoleKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coordinator" => Ok(RoleKey::Coordinator),
            "analyst" => Ok(RoleKey::Analyst),
            "architect" => Ok(RoleKey::Architect),
            "developer" => Ok(RoleKey::Developer),
            "reviewer" => Ok(RoleKey::Reviewer),
            other => Err(EngineError::UnknownRole {
                key: other.to_string(),
                valid: RoleKey::valid_keys(),
            }),
        }
    }
}

impl std::fmt::Display for RoleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load role instructions, preferring `<prompt_dir>/<role>.md`.
///
/// A missing or unreadable file falls back to the built-in default so
/// a fresh install works without any prompt files.
pub fn load_instructions(role: RoleKey, prompt_dir: &Path) -> String {
    let path = prompt_dir.join(format!("{}.md", role.as_str()));
    match std::fs::read_to_string(&path) {
        Ok(contents) if !contents.trim().is_empty() => contents,
        Ok(_) => role.default_instructions().to_string(),
        Err(_) => {
            tracing::debug!(role = %role, path = %path.display(), "No prompt file, using built-in instructions");
            role.default_instructions().to_string()
        }
    }
}

/// How an incoming message should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Conversational reply from the coordinator
    Chat,
    /// Actionable work for a specialist pipeline
    Agent,
}

/// Classify a message as conversation or actionable work.
///
/// A `task:` prefix is an explicit agent request; otherwise a small set
/// of imperative verbs near the start of the message tips it to agent
/// mode. Everything else is chat.
pub fn detect_mode(input: &str) -> Mode {
    let lowered = input.trim().to_ascii_lowercase();

    if lowered.starts_with("task:") {
        return Mode::Agent;
    }

    const ACTION_VERBS: [&str; 8] = [
        "build", "fix", "implement", "create", "refactor", "write", "add", "deploy",
    ];
    let leading: Vec<&str> = lowered.split_whitespace().take(3).collect();
    if leading
        .iter()
        .any(|word| ACTION_VERBS.contains(word))
    {
        return Mode::Agent;
    }

    Mode::Chat
}
