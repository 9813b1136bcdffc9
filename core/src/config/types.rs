//! Resolved configuration types for haggle core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Default request timeout for a single completion
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Supported LLM protocols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Local Ollama server (native `/api/chat` endpoint)
    #[serde(rename = "ollama")]
    Ollama,
    /// OpenAI-compatible API (includes OpenAI, many proxies, local servers)
    #[serde(rename = "openai_compat")]
    OpenAICompat,
    /// Anthropic Claude API
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl Protocol {
    /// Get the protocol name as a string
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Ollama => "ollama",
            Protocol::OpenAICompat => "openai_compat",
            Protocol::Anthropic => "anthropic",
        }
    }

    /// Get the default base URL for this protocol
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Protocol::Ollama => "http://localhost:11434",
            Protocol::OpenAICompat => "https://api.openai.com/v1",
            Protocol::Anthropic => "https://api.anthropic.com",
        }
    }

    /// Get the default model for this protocol
    pub fn default_model(&self) -> &'static str {
        match self {
            Protocol::Ollama => "llama3.1:8b",
            Protocol::OpenAICompat => "gpt-4o-mini",
            Protocol::Anthropic => "claude-3-5-haiku-20241022",
        }
    }

    /// Environment variable conventionally holding the API key
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Protocol::Ollama => None,
            Protocol::OpenAICompat => Some("OPENAI_API_KEY"),
            Protocol::Anthropic => Some("ANTHROPIC_API_KEY"),
        }
    }

    /// Whether requests must carry an API key
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Protocol::Ollama)
    }
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Protocol::Ollama),
            "openai" | "openai_compat" => Ok(Protocol::OpenAICompat),
            "anthropic" => Ok(Protocol::Anthropic),
            other => Err(ConfigError::UnsupportedProtocol {
                name: other.to_string(),
            }),
        }
    }
}

/// Model parameters for LLM requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
}

/// A fully resolved LLM configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// The protocol to use
    pub protocol: Protocol,
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication (empty for local Ollama)
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers for requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(protocol: Protocol, base_url: String, api_key: String, model: String) -> Self {
        Self {
            protocol,
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Local Ollama defaults: `llama3.1:8b` on `localhost:11434`
    pub fn local_ollama() -> Self {
        Self::new(
            Protocol::Ollama,
            Protocol::Ollama.default_base_url().to_string(),
            String::new(),
            Protocol::Ollama.default_model().to_string(),
        )
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Add multiple headers
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Set the request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol.requires_api_key() && self.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "api_key".to_string(),
            });
        }

        if self.model.is_empty() {
            return Err(ConfigError::MissingField {
                field: "model".to_string(),
            });
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::InvalidValue {
                    field: "params.temperature".to_string(),
                    value: temp.to_string(),
                });
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ConfigError::InvalidValue {
                    field: "params.top_p".to_string(),
                    value: top_p.to_string(),
                });
            }
        }

        Ok(())
    }
}
