//! Router / Dispatcher
//!
//! The central fault-tolerant decision point: resolves which backend and
//! variant serve a request (explicit override or the pure selector), runs
//! the invocation with a per-call timeout, and applies exactly one
//! cross-backend fallback hop on a backend failure.
//!
//! The bounded single retry is deliberate: cross-backend fallback is a
//! circuit breaker, not a queue. No backoff, no same-backend retry.

use super::invoker::Invoker;
use super::selector::{Selector, TaskProfile};
use super::{BackendId, Message, ModelChoice};
use crate::config::LlmConfig;
use crate::error::EngineError;
use std::time::Duration;

/// Outcome of a routed request: the response text plus the choice that
/// actually produced it (which may be the fallback).
#[derive(Debug, Clone)]
pub struct RoutedResponse {
    pub text: String,
    pub choice: ModelChoice,
}

pub struct Router {
    invoker: Invoker,
    selector: Selector,

    /// The smart backend's fastest variant, target of the non-smart
    /// fallback hop.
    fast_variant: String,
    timeout: Duration,
}

impl Router {
    pub fn new(invoker: Invoker, config: &LlmConfig) -> Self {
        Self {
            invoker,
            selector: Selector::new(&config.anthropic),
            fast_variant: config.anthropic.fast_model.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }

    /// Main entry point for agents to get a model response.
    ///
    /// 1. Resolve the `ModelChoice` (override parsing or selector).
    /// 2. Invoke the chosen backend/variant.
    /// 3. On a backend failure, retry exactly once on the fallback target.
    ///    A fallback failure propagates the fallback's error, not the
    ///    original one.
    pub async fn process(
        &self,
        input: &str,
        system_instruction: &str,
        profile: &TaskProfile,
        model_override: Option<&str>,
    ) -> Result<RoutedResponse, EngineError> {
        let choice = match model_override {
            Some(spec) => Self::parse_override(spec)?,
            None => self.selector.select(profile),
        };

        let messages = vec![
            Message::system(system_instruction),
            Message::user(input),
        ];

        tracing::debug!(choice = %choice.label(), task = ?profile.task_type, "Dispatching request");

        match self.attempt(&choice, &messages).await {
            Ok(text) => Ok(RoutedResponse { text, choice }),
            Err(EngineError::Backend(primary_error)) => {
                let fallback = self.fallback_for(&choice);
                tracing::warn!(
                    failed = %choice.label(),
                    fallback = %fallback.label(),
                    error = %primary_error,
                    "Primary backend failed; attempting fallback"
                );

                match self.attempt(&fallback, &messages).await {
                    Ok(text) => Ok(RoutedResponse {
                        text,
                        choice: fallback,
                    }),
                    Err(secondary_error) => {
                        tracing::error!(error = %secondary_error, "Fallback also failed");
                        Err(secondary_error)
                    }
                }
            }
            Err(other) => Err(other),
        }
    }

    /// One invocation attempt, bounded by the per-call timeout.
    ///
    /// A timeout counts as a backend failure so it participates in the
    /// fallback hop.
    async fn attempt(
        &self,
        choice: &ModelChoice,
        messages: &[Message],
    ) -> Result<String, EngineError> {
        match tokio::time::timeout(self.timeout, self.invoker.invoke(choice, messages)).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Backend(super::BackendError::Timeout)),
        }
    }

    /// Parse an explicit model override.
    ///
    /// Accepted shapes:
    /// - a specific variant name, owning backend implied by its prefix
    ///   ("claude-..." or "gemini-...")
    /// - a bare backend name ("anthropic"/"claude", "gemini"/"google"),
    ///   meaning that backend's default variant
    /// - anything else is rejected as an unknown backend id
    fn parse_override(spec: &str) -> Result<ModelChoice, EngineError> {
        let spec = spec.trim();

        if spec.starts_with("claude-") {
            return Ok(ModelChoice::new(
                BackendId::Anthropic,
                Some(spec.to_string()),
            ));
        }
        if spec.starts_with("gemini-") {
            return Ok(ModelChoice::new(BackendId::Gemini, Some(spec.to_string())));
        }

        spec.parse::<BackendId>()
            .map(|backend| ModelChoice::new(backend, None))
            .map_err(EngineError::Validation)
    }

    /// The single fallback target for a failed choice.
    ///
    /// Smart/complex backend failed -> the alternate backend's default
    /// variant. Any other backend failed -> the smart backend's fastest
    /// variant.
    fn fallback_for(&self, failed: &ModelChoice) -> ModelChoice {
        match failed.backend {
            BackendId::Anthropic => ModelChoice::new(BackendId::Gemini, None),
            _ => ModelChoice::new(BackendId::Anthropic, Some(self.fast_variant.clone())),
        }
    }
}
