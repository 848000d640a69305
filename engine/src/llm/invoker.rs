//! Backend registry
//!
//! Holds whichever concrete backends the deployment configured and
//! dispatches a `ModelChoice` to the right one. A backend that is absent
//! (missing API key, or disabled by feature flag) yields a configuration
//! error at first use rather than a crash or a retryable backend error,
//! and its absence does not affect the other backend.

use super::models::AliasMap;
use super::{anthropic::AnthropicBackend, gemini::GeminiBackend};
use super::{BackendId, Message, ModelBackend, ModelChoice};
use crate::config::LlmConfig;
use crate::error::EngineError;
use crate::secrets::{SecretStore, ANTHROPIC_KEY_VAR, GEMINI_KEY_VAR};
use std::collections::HashMap;

pub struct Invoker {
    backends: HashMap<BackendId, Box<dyn ModelBackend>>,

    /// Why an absent backend is absent, for the configuration error.
    unavailable: HashMap<BackendId, String>,
}

impl Invoker {
    /// Build the registry from config and the secret store.
    ///
    /// Each backend is constructed only when its credentials are present
    /// (and, for Gemini, the feature flag is on). Missing pieces are
    /// recorded so first use fails with a descriptive error instead of
    /// failing the whole startup.
    pub fn from_config(config: &LlmConfig, secrets: &SecretStore) -> Self {
        let mut backends: HashMap<BackendId, Box<dyn ModelBackend>> = HashMap::new();
        let mut unavailable = HashMap::new();

        let aliases = AliasMap::with_overrides(&config.model_aliases);

        match secrets.get(ANTHROPIC_KEY_VAR) {
            Ok(key) => {
                backends.insert(
                    BackendId::Anthropic,
                    Box::new(AnthropicBackend::new(
                        config.anthropic.clone(),
                        key,
                        aliases.clone(),
                    )),
                );
            }
            Err(_) => {
                unavailable.insert(
                    BackendId::Anthropic,
                    format!("Anthropic backend needs {} to be set", ANTHROPIC_KEY_VAR),
                );
            }
        }

        if !config.gemini.enabled {
            unavailable.insert(
                BackendId::Gemini,
                "Gemini backend is disabled in config ([llm.gemini] enabled = false)".to_string(),
            );
        } else {
            match secrets.get(GEMINI_KEY_VAR) {
                Ok(key) => {
                    backends.insert(
                        BackendId::Gemini,
                        Box::new(GeminiBackend::new(config.gemini.clone(), key, aliases)),
                    );
                }
                Err(_) => {
                    unavailable.insert(
                        BackendId::Gemini,
                        format!("Gemini backend needs {} to be set", GEMINI_KEY_VAR),
                    );
                }
            }
        }

        Self {
            backends,
            unavailable,
        }
    }

    /// Build a registry from explicit backend instances (test doubles).
    pub fn with_backends(backends: Vec<Box<dyn ModelBackend>>) -> Self {
        Self {
            backends: backends.into_iter().map(|b| (b.id(), b)).collect(),
            unavailable: HashMap::new(),
        }
    }

    /// Whether a backend is configured and usable.
    pub fn has_backend(&self, id: BackendId) -> bool {
        self.backends.contains_key(&id)
    }

    fn backend(&self, id: BackendId) -> Result<&dyn ModelBackend, EngineError> {
        self.backends.get(&id).map(|b| b.as_ref()).ok_or_else(|| {
            let reason = self
                .unavailable
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("{} backend is not configured", id));
            EngineError::Config(reason)
        })
    }

    /// Dispatch one invocation to the chosen backend/variant.
    pub async fn invoke(
        &self,
        choice: &ModelChoice,
        messages: &[Message],
    ) -> Result<String, EngineError> {
        let backend = self.backend(choice.backend)?;
        let text = backend.invoke(choice.variant.as_deref(), messages).await?;
        Ok(text)
    }
}
