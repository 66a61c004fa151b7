//! Configuration loading, validation, and management for Agentloom.
//!
//! Loads configuration from `~/.agentloom/config.toml` with environment
//! variable overrides, and loads workflow descriptors from JSON files.
//! Validates all settings at startup.

pub mod descriptor;

pub use descriptor::{
    Connection, DescriptorAgent, DescriptorError, Orchestration, WorkflowDescriptor,
    WorkflowMetadata,
};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.agentloom/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM back-end settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Default caps applied to agents that specify none
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Settings for the OpenAI-compatible chat-completions back-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the API (local LM Studio server by default)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier passed through to the back-end
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap per request
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,

    /// Transient-failure retries per completion call
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:1234/v1".into()
}
fn default_model() -> String {
    "local-model".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_llm_timeout_secs() -> u64 {
    120
}
fn default_llm_max_retries() -> u32 {
    2
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_llm_max_retries(),
        }
    }
}

/// Per-agent caps applied when the descriptor leaves them unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Reasoning iteration cap per agent run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Wall-clock cap in seconds per agent run
    #[serde(default = "default_max_wall_clock_secs")]
    pub max_wall_clock_secs: u64,

    /// Timeout in seconds per tool invocation
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Byte cap on tool output entering the transcript
    #[serde(default = "default_observation_max_bytes")]
    pub observation_max_bytes: usize,

    /// Base backoff in seconds for the Retry error policy
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

fn default_max_iterations() -> u32 {
    8
}
fn default_max_wall_clock_secs() -> u64 {
    120
}
fn default_tool_timeout_secs() -> u64 {
    30
}
fn default_observation_max_bytes() -> usize {
    4000
}
fn default_retry_backoff_secs() -> u64 {
    2
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_wall_clock_secs: default_max_wall_clock_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            observation_max_bytes: default_observation_max_bytes(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.agentloom/config.toml).
    ///
    /// Environment variable overrides:
    /// - `AGENTLOOM_BASE_URL` — LLM API base URL
    /// - `AGENTLOOM_MODEL` — model identifier
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(base_url) = std::env::var("AGENTLOOM_BASE_URL") {
            config.llm.base_url = base_url;
        }
        if let Ok(model) = std::env::var("AGENTLOOM_MODEL") {
            config.llm.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".agentloom")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.temperature < 0.0 || self.llm.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.defaults.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "defaults.max_iterations must be at least 1".into(),
            ));
        }

        if self.defaults.observation_max_bytes < 64 {
            return Err(ConfigError::ValidationError(
                "defaults.observation_max_bytes must be at least 64".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `doctor --write-config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.llm.base_url, "http://127.0.0.1:1234/v1");
        assert_eq!(config.defaults.max_iterations, 8);
        assert_eq!(config.defaults.observation_max_bytes, 4000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
        assert_eq!(parsed.defaults.tool_timeout_secs, config.defaults.tool_timeout_secs);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.llm.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.defaults.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().llm.model, "local-model");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[llm]
model = "qwen2.5-32b-instruct"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.llm.model, "qwen2.5-32b-instruct");
        assert_eq!(config.llm.base_url, "http://127.0.0.1:1234/v1");
        assert_eq!(config.defaults.max_wall_clock_secs, 120);
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("base_url"));
        assert!(toml_str.contains("max_iterations"));
    }
}
