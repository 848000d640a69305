//! Secret management
//!
//! API credentials come from process environment variables, mirroring how
//! deployments inject them. Values are wrapped in [`SecretString`] so they
//! never leak through `Debug`/`Display` formatting or log output.

mod string;

pub use string::SecretString;

use crate::error::EngineError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";

/// Environment variable holding the Gemini API key
pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";

/// Read-through store for API credentials.
///
/// Values are read from the environment on first access and cached for the
/// process lifetime. Whitespace is stripped, a common `.env` copy-paste
/// issue.
pub struct SecretStore {
    cache: Mutex<HashMap<String, SecretString>>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a secret by environment variable name.
    ///
    /// Returns `EngineError::Config` when the variable is unset or empty.
    pub fn get(&self, var: &str) -> Result<SecretString, EngineError> {
        if let Ok(cache) = self.cache.lock() {
            if let Some(secret) = cache.get(var) {
                return Ok(secret.clone());
            }
        }

        let value = std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EngineError::Config(format!("{} is not set", var)))?;

        let secret = SecretString::new(value);
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(var.to_string(), secret.clone());
        }
        Ok(secret)
    }

    /// Check whether a secret is available without surfacing its value.
    pub fn is_available(&self, var: &str) -> bool {
        self.get(var).is_ok()
    }
}

impl Default for SecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_secret_is_config_error() {
        let store = SecretStore::new();
        let err = store.get("TROUPE_TEST_UNSET_VAR").unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_secret_is_trimmed_and_cached() {
        std::env::set_var("TROUPE_TEST_KEY", "  sk-test-123  ");
        let store = SecretStore::new();
        let secret = store.get("TROUPE_TEST_KEY").expect("secret should load");
        assert_eq!(secret.unsecure(), "sk-test-123");

        // Cached value survives the variable being removed.
        std::env::remove_var("TROUPE_TEST_KEY");
        assert!(store.is_available("TROUPE_TEST_KEY"));
    }
}
