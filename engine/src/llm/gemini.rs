use super::models::AliasMap;
use super::{BackendError, BackendId, Message, ModelBackend};
use crate::config::GeminiConfig;
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde_json::json;

/// Gemini backend.
///
/// The fast alternate backend. It is optional at deployment time and
/// carries exactly one implicit default model, so requests routed here
/// normally carry no variant name. Explicit variant names (overrides)
/// still go through the alias map before hitting the API.
#[derive(Debug)]
pub struct GeminiBackend {
    config: GeminiConfig,
    api_key: SecretString,
    aliases: AliasMap,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig, api_key: SecretString, aliases: AliasMap) -> Self {
        Self {
            config,
            api_key,
            aliases,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn id(&self) -> BackendId {
        BackendId::Gemini
    }

    fn default_variant(&self) -> &str {
        &self.config.model
    }

    async fn invoke(&self, variant: Option<&str>, messages: &[Message]) -> super::Result<String> {
        let model = self
            .aliases
            .resolve(variant.unwrap_or_else(|| self.default_variant()));

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url,
            model,
            self.api_key.unsecure()
        );

        let mut contents = Vec::new();
        let mut system_instruction = None;

        for msg in messages {
            if msg.role == super::MessageRole::System {
                system_instruction = Some(json!({
                    "parts": [{"text": msg.content}]
                }));
                continue;
            }

            contents.push(json!({
                "role": if msg.role == super::MessageRole::Assistant { "model" } else { "user" },
                "parts": [{"text": msg.content}]
            }));
        }

        let mut payload = serde_json::Map::new();
        payload.insert("contents".to_string(), json!(contents));

        if let Some(sys) = system_instruction {
            payload.insert("systemInstruction".to_string(), sys);
        }

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                400 | 404 => BackendError::InvalidRequest(text),
                429 => BackendError::RateLimited,
                401 | 403 => BackendError::AuthenticationFailed(text),
                _ => BackendError::Unavailable(format!("Gemini API error ({}): {}", status, text)),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        let candidate = data
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| BackendError::Parse("No candidates in response".to_string()))?;

        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array())
            .ok_or_else(|| BackendError::Parse("No parts in candidate content".to_string()))?;

        let mut full_text = String::new();
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                full_text.push_str(text);
            }
        }

        Ok(full_text)
    }
}
