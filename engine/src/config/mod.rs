//! Configuration management
//!
//! This module handles loading, validation, and management of the Troupe
//! configuration. Configuration is stored in TOML format at
//! ~/.troupe/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Data directory, log level, role prompt directory
//! - **llm**: Backend settings, per-call timeout, variant alias overrides
//! - **memory**: Recall thresholds and limits
//!
//! API keys are NOT stored here; they come from the environment (see the
//! `secrets` module).
//!
//! # Examples
//!
//! ```no_run
//! use troupe_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Data dir: {:?}", config.core.data_dir);
//! # Ok(())
//! # }
//! ```

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Model backend configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Memory recall configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding per-role instruction files (`<role>.md`)
    #[serde(default = "default_prompt_dir")]
    pub prompt_dir: PathBuf,
}

/// Model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Per-call timeout applied at the backend-call boundary (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Anthropic backend settings
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Gemini backend settings
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Variant alias overrides merged on top of the built-in alias table.
    /// Override entries win on key collision.
    #[serde(default)]
    pub model_aliases: HashMap<String, String>,
}

/// Anthropic backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Base URL for the Anthropic API
    #[serde(default = "default_anthropic_base_url")]
    pub base_url: String,

    /// Highest-capability variant (selector rule 2)
    #[serde(default = "default_smart_model")]
    pub smart_model: String,

    /// Specialized-reasoning variant (selector rule 3)
    #[serde(default = "default_reasoning_model")]
    pub reasoning_model: String,

    /// Balanced default variant (selector rule 4)
    #[serde(default = "default_balanced_model")]
    pub balanced_model: String,

    /// Fastest Anthropic variant, used for the fallback hop
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
    // Note: API key comes from ANTHROPIC_API_KEY, not from config
}

/// Gemini backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Feature flag; the Anthropic backend works fine with this off
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL for the Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// The single implicit default model for this backend
    #[serde(default = "default_gemini_model")]
    pub model: String,
    // Note: API key comes from GEMINI_API_KEY, not from config
}

/// Memory recall configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Minimum importance for the "critical decisions" selection
    #[serde(default = "default_critical_min_importance")]
    pub critical_min_importance: i64,

    /// Maximum critical entries recalled per request
    #[serde(default = "default_critical_limit")]
    pub critical_limit: i64,

    /// Maximum recent entries recalled per request
    #[serde(default = "default_recent_limit")]
    pub recent_limit: i64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.troupe")
}

fn default_prompt_dir() -> PathBuf {
    PathBuf::from("~/.troupe/prompts")
}

fn default_anthropic_base_url() -> String {
    "https://api.anthropic.com/v1".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_smart_model() -> String {
    "claude-opus-4-5".to_string()
}

fn default_reasoning_model() -> String {
    "claude-opus-4-1".to_string()
}

fn default_balanced_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_fast_model() -> String {
    "claude-haiku-4-5".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_critical_min_importance() -> i64 {
    8
}

fn default_critical_limit() -> i64 {
    5
}

fn default_recent_limit() -> i64 {
    5
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            prompt_dir: default_prompt_dir(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            anthropic: AnthropicConfig::default(),
            gemini: GeminiConfig::default(),
            model_aliases: HashMap::new(),
        }
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: default_anthropic_base_url(),
            smart_model: default_smart_model(),
            reasoning_model: default_reasoning_model(),
            balanced_model: default_balanced_model(),
            fast_model: default_fast_model(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            critical_min_importance: default_critical_min_importance(),
            critical_limit: default_critical_limit(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.troupe/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default
    /// configuration, writes it out, and returns it.
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save it to `path`
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Config::default();

        let contents = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Default configuration file path (~/.troupe/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".troupe").join("config.toml"))
    }

    /// Validate and normalize the configuration
    ///
    /// Expands ~ in paths and rejects obviously broken values.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        self.core.data_dir = expand_tilde(&self.core.data_dir)?;
        self.core.prompt_dir = expand_tilde(&self.core.prompt_dir)?;

        match self.core.log_level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            other => {
                return Err(EngineError::Config(format!(
                    "Invalid log level '{}'; expected error, warn, info, debug, or trace",
                    other
                )))
            }
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.llm.anthropic.base_url.is_empty() || self.llm.gemini.base_url.is_empty() {
            return Err(EngineError::Config(
                "Backend base URLs must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the sqlite database file inside the data directory
    pub fn db_path(&self) -> PathBuf {
        self.core.data_dir.join("troupe.db")
    }
}

/// Expand a leading ~ to the user's home directory
fn expand_tilde(path: &Path) -> Result<PathBuf, EngineError> {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(rest))
    } else if s == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
