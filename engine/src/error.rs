//! Error types and handling
//!
//! This module provides the error taxonomy used throughout the Troupe engine.
//! The router recovers from `Backend` errors exactly once via its fallback
//! hop; every other kind propagates unchanged to the caller.

use crate::llm::BackendError;
use thiserror::Error;

/// Trait for engine error extensions
///
/// Provides a user-facing hint and a recoverability flag for each error.
/// Recoverable errors can be retried or worked around; non-recoverable
/// errors need operator intervention (fixing credentials, config, input).
pub trait ErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
#[derive(Debug, Error)]
pub enum EngineError {
    /// Missing or invalid configuration (credentials, disabled backend).
    /// Fatal at startup or first use; never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transient model backend failure. The router applies exactly one
    /// cross-backend fallback hop for this kind, then propagates.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Invalid role key at the registry boundary.
    #[error("Unknown role: '{key}'. Valid roles: {valid:?}")]
    UnknownRole {
        key: String,
        valid: Vec<&'static str>,
    },

    /// Malformed request (e.g. an unparseable model override).
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Persistence failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl ErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            EngineError::Config(_) => {
                "Check ~/.troupe/config.toml and that the backend API keys are exported"
            }
            EngineError::Backend(_) => "The model backend call failed; try again shortly",
            EngineError::UnknownRole { .. } => "Use `troupe roles` to list the available roles",
            EngineError::Validation(_) => "Check the request arguments and retry",
            EngineError::Database(_) => "Check that the data directory is writable",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, EngineError::Backend(_) | EngineError::Database(_))
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(e: anyhow::Error) -> Self {
        EngineError::Database(format!("{:#}", e))
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Validation(format!("JSON serialization failed: {}", e))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_not_recoverable() {
        let err = EngineError::Config("missing ANTHROPIC_API_KEY".to_string());
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_backend_error_recoverable() {
        let err = EngineError::Backend(BackendError::Timeout);
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_unknown_role_lists_valid_keys() {
        let err = EngineError::UnknownRole {
            key: "wizard".to_string(),
            valid: vec!["coordinator", "developer"],
        };
        let msg = err.to_string();
        assert!(msg.contains("wizard"));
        assert!(msg.contains("coordinator"));
        assert!(!err.is_recoverable());
    }
}
