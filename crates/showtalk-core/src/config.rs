use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ShowtalkError};
use crate::types::{GroundingStrategy, ReasoningLevel};

/// Keyword used when a search has nothing better to go on.
pub const DEFAULT_KEYWORD: &str = "Kardashian";

/// Top-level configuration for the showtalk server.
///
/// Loaded from `~/.showtalk/config.toml` by default. The LLM credential is
/// never stored here; only the name of the environment variable holding it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShowtalkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl ShowtalkConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ShowtalkConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ShowtalkError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the SQLite catalog.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP listen port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.showtalk/data".to_string(),
            log_level: "info".to_string(),
            port: 3030,
        }
    }
}

/// LLM endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    /// Model name sent with each request.
    pub model: String,
    /// Environment variable holding the API key, read per request.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Keep the model's reasoning trace in replies.
    pub show_thinking: bool,
    /// Optional reasoning effort hint.
    pub reasoning_level: Option<ReasoningLevel>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/v1".to_string(),
            model: "default".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 120,
            show_thinking: false,
            reasoning_level: None,
        }
    }
}

/// Chat flow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Naive (always search) or decided (ask the model first).
    pub strategy: GroundingStrategy,
    /// Keyword used when the model says YES without naming a word.
    pub decision_fallback_keyword: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            strategy: GroundingStrategy::default(),
            decision_fallback_keyword: DEFAULT_KEYWORD.to_string(),
        }
    }
}

/// Episode search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Keyword substituted for an empty or blank search.
    pub default_keyword: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_keyword: DEFAULT_KEYWORD.to_string(),
        }
    }
}
