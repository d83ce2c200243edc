//! Runtime configuration loaded from TOML.
//!
//! Every field has a default, so an empty document is a valid
//! configuration. Environment overrides are applied on top of the file.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::DEFAULT_MAX_STEPS;
use crate::error::{ConfigError, ConfigResult};
use crate::memory::DEFAULT_MAX_MESSAGES;
use crate::stall::DEFAULT_DUPLICATE_THRESHOLD;

/// Overrides `llm.api_key`.
pub const ENV_API_KEY: &str = "RUNLOOP_API_KEY";
/// Overrides `llm.model`.
pub const ENV_MODEL: &str = "RUNLOOP_MODEL";
/// Overrides `logging.level`.
pub const ENV_LOG: &str = "RUNLOOP_LOG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunloopConfig {
    pub agent: AgentSettings,
    pub llm: LlmSettings,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_steps: usize,
    pub duplicate_threshold: usize,
    /// Conversation memory capacity.
    pub max_messages: usize,
    /// Truncation length for tool observations; unset keeps them whole.
    pub max_observe: Option<usize>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            duplicate_threshold: DEFAULT_DUPLICATE_THRESHOLD,
            max_messages: DEFAULT_MAX_MESSAGES,
            max_observe: Some(10_000),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            max_tokens: 4096,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() { "" } else { "[REDACTED]" };
        f.debug_struct("LlmSettings")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &api_key)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl RunloopConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::load_from_toml(&content)
    }

    /// Load configuration from a TOML string.
    pub fn load_from_toml(toml_content: &str) -> ConfigResult<Self> {
        toml::from_str(toml_content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `RUNLOOP_*` environment overrides.
    pub fn from_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.llm.api_key = api_key;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.llm.model = model;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.logging.level = level;
        }
        self
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.agent.max_steps == 0 {
            return Err(ConfigError::invalid("agent.max_steps", "must be positive"));
        }
        if self.agent.duplicate_threshold == 0 {
            return Err(ConfigError::invalid(
                "agent.duplicate_threshold",
                "must be positive",
            ));
        }
        if self.agent.max_messages == 0 {
            return Err(ConfigError::invalid("agent.max_messages", "must be positive"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::invalid("llm.model", "cannot be empty"));
        }
        if self.llm.api_key.is_empty() {
            tracing::warn!("No API key configured; requests will be sent unauthenticated");
        }
        Ok(())
    }
}
