use super::models::AliasMap;
use super::{BackendError, BackendId, Message, ModelBackend};
use crate::config::AnthropicConfig;
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One cached handle per resolved variant identifier.
///
/// Repeated requests for the same variant reuse the same handle, so
/// connection pools and per-variant settings are shared within the
/// process lifetime.
#[derive(Debug)]
struct VariantHandle {
    model: String,
    client: reqwest::Client,
}

/// Anthropic ("Claude") backend.
///
/// The smart/complex backend: it carries several named variants, selected
/// per request. Variant aliases are resolved through the alias map before
/// the handle cache is consulted, so "claude-fastest" and its canonical id
/// share one handle.
#[derive(Debug)]
pub struct AnthropicBackend {
    config: AnthropicConfig,
    api_key: SecretString,
    aliases: AliasMap,
    handles: Mutex<HashMap<String, Arc<VariantHandle>>>,
}

impl AnthropicBackend {
    pub fn new(config: AnthropicConfig, api_key: SecretString, aliases: AliasMap) -> Self {
        Self {
            config,
            api_key,
            aliases,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Get or lazily create the handle for a variant.
    ///
    /// The mutex guarantees exactly-once construction per resolved id.
    fn handle_for(&self, variant: &str) -> Arc<VariantHandle> {
        let resolved = self.aliases.resolve(variant).to_string();

        let mut handles = match self.handles.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = handles.get(&resolved) {
            return Arc::clone(handle);
        }

        tracing::debug!(model = %resolved, "Creating Anthropic client handle");
        let handle = Arc::new(VariantHandle {
            model: resolved.clone(),
            client: reqwest::Client::new(),
        });
        handles.insert(resolved, Arc::clone(&handle));
        handle
    }

    /// Number of distinct handles created so far (used by tests).
    pub fn cached_handles(&self) -> usize {
        match self.handles.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn id(&self) -> BackendId {
        BackendId::Anthropic
    }

    fn default_variant(&self) -> &str {
        &self.config.balanced_model
    }

    async fn invoke(&self, variant: Option<&str>, messages: &[Message]) -> super::Result<String> {
        let handle = self.handle_for(variant.unwrap_or_else(|| self.default_variant()));

        let url = format!("{}/messages", self.config.base_url);

        // The Messages API takes the system instruction as a top-level
        // field, not as a message row.
        let mut system_prompt = String::new();
        let mut api_messages = Vec::new();
        for msg in messages {
            if msg.role == super::MessageRole::System {
                system_prompt.push_str(&msg.content);
                system_prompt.push('\n');
                continue;
            }
            api_messages.push(json!({
                "role": if msg.role == super::MessageRole::Assistant { "assistant" } else { "user" },
                "content": msg.content
            }));
        }

        let payload = json!({
            "model": handle.model,
            "max_tokens": 4096,
            "system": system_prompt,
            "messages": api_messages,
        });

        let response = handle
            .client
            .post(&url)
            .header("x-api-key", self.api_key.unsecure())
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => BackendError::AuthenticationFailed(text),
                429 => BackendError::RateLimited,
                400 | 404 => BackendError::InvalidRequest(text),
                _ => BackendError::Unavailable(format!("Anthropic API error ({}): {}", status, text)),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        let content_arr = data
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| BackendError::Parse("No content array in response".to_string()))?;

        let mut full_content = String::new();
        for item in content_arr {
            if let Some(text) = item.get("text").and_then(|t| t.as_str()) {
                full_content.push_str(text);
            }
        }

        Ok(full_content)
    }
}
