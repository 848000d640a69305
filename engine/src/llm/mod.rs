//! Model Backend Abstraction Layer
//!
//! This module provides a common interface for the two interchangeable
//! model backends (Anthropic, Gemini). The `ModelBackend` trait defines
//! the contract both implement, so the router and the fallback logic can
//! work with either transparently, including test doubles that simulate
//! failure without network calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod anthropic;
pub mod gemini;
pub mod invoker;
pub mod models;
pub mod router;
pub mod selector;

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur while invoking a model backend.
///
/// Every variant is transient from the router's point of view and triggers
/// its single fallback hop. Configuration problems (missing key, disabled
/// backend) are NOT backend errors; see `EngineError::Config`.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Identifier for a concrete model backend.
///
/// A closed enum: the system supports exactly these two, one of which
/// (Gemini) is optional at deployment time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendId {
    Anthropic,
    Gemini,
}

impl BackendId {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Anthropic => "anthropic",
            BackendId::Gemini => "gemini",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(BackendId::Anthropic),
            "gemini" | "google" => Ok(BackendId::Gemini),
            other => Err(format!("unknown backend id '{}'", other)),
        }
    }
}

/// A routing decision: which backend serves the request, and with which
/// named variant. Computed fresh per request; never persisted.
///
/// `variant` is `None` only when the backend has exactly one implicit
/// default model (Gemini).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub backend: BackendId,
    pub variant: Option<String>,
}

impl ModelChoice {
    pub fn new(backend: BackendId, variant: Option<String>) -> Self {
        Self { backend, variant }
    }

    /// Human-readable label for logs and the `model_used` column.
    pub fn label(&self) -> String {
        match &self.variant {
            Some(v) => format!("{}:{}", self.backend, v),
            None => self.backend.to_string(),
        }
    }
}

/// Message in a conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// Model backend trait both concrete backends implement
#[async_trait]
pub trait ModelBackend: Send + Sync + std::fmt::Debug {
    /// Which backend this is
    fn id(&self) -> BackendId;

    /// The variant used when a request carries no explicit variant
    fn default_variant(&self) -> &str;

    /// Send an ordered message sequence to the given variant and return
    /// the response text.
    ///
    /// # Arguments
    /// * `variant` - Named model variant; `None` uses the backend default
    /// * `messages` - Ordered sequence including the system instruction
    async fn invoke(&self, variant: Option<&str>, messages: &[Message]) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(user_msg.content, "Hello");

        let assistant_msg = Message::assistant("Hi there");
        assert_eq!(assistant_msg.role, MessageRole::Assistant);

        let system_msg = Message::system("You are a helpful assistant");
        assert_eq!(system_msg.role, MessageRole::System);
    }

    #[test]
    fn test_backend_id_parsing() {
        assert_eq!("anthropic".parse::<BackendId>(), Ok(BackendId::Anthropic));
        assert_eq!("claude".parse::<BackendId>(), Ok(BackendId::Anthropic));
        assert_eq!("gemini".parse::<BackendId>(), Ok(BackendId::Gemini));
        assert_eq!("GEMINI".parse::<BackendId>(), Ok(BackendId::Gemini));
        assert!("mistral".parse::<BackendId>().is_err());
    }

    #[test]
    fn test_model_choice_label() {
        let with_variant = ModelChoice::new(
            BackendId::Anthropic,
            Some("claude-sonnet-4-5".to_string()),
        );
        assert_eq!(with_variant.label(), "anthropic:claude-sonnet-4-5");

        let bare = ModelChoice::new(BackendId::Gemini, None);
        assert_eq!(bare.label(), "gemini");
    }

    #[test]
    fn test_message_serialization() {
        let msg = Message::user("test");
        let json = serde_json::to_string(&msg).expect("serializes");
        assert!(json.contains(r#""role":"user""#));
        let deserialized: Message = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(msg, deserialized);
    }
}
