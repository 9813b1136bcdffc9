//! LLM provider implementations

pub mod anthropic;
pub mod ollama;
pub mod openai;
pub mod scripted;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use scripted::ScriptedClient;

use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::Result;
use crate::llm::LlmClient;
use std::sync::Arc;

/// Create an LLM client for the configured protocol
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.protocol {
        Protocol::Ollama => Arc::new(OllamaClient::new(config)?),
        Protocol::OpenAICompat => Arc::new(OpenAiClient::new(config)?),
        Protocol::Anthropic => Arc::new(AnthropicClient::new(config)?),
    };

    tracing::debug!(
        "Created {} client for model {}",
        client.provider_name(),
        client.model_name()
    );

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_client_per_protocol() {
        let client = create_client(&ResolvedLlmConfig::local_ollama()).unwrap();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.model_name(), "llama3.1:8b");

        let anthropic = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com".to_string(),
            "sk-ant-test".to_string(),
            "claude-3-5-haiku-20241022".to_string(),
        );
        let client = create_client(&anthropic).unwrap();
        assert_eq!(client.provider_name(), "anthropic");
    }

    #[test]
    fn test_openai_without_key_fails() {
        let config = ResolvedLlmConfig::new(
            Protocol::OpenAICompat,
            "https://api.openai.com/v1".to_string(),
            String::new(),
            "gpt-4o-mini".to_string(),
        );
        assert!(create_client(&config).is_err());
    }
}
