//! Anthropic Claude client implementation

use crate::config::{ModelParams, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use crate::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Anthropic Claude client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    params: ModelParams,
    headers: HashMap<String, String>,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for Anthropic".to_string(),
            }
            .into());
        }

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            params: config.params.clone(),
            headers: config.headers.clone(),
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, options);

        let mut builder = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json");
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status,
                message: error_text,
            }
            .into());
        }

        let anthropic_response: AnthropicResponse =
            response.json().await.map_err(|e| LlmError::Network {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.convert_response(anthropic_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

impl AnthropicClient {
    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> AnthropicRequest {
        let options = options.unwrap_or_else(|| ChatOptions::from(&self.params));

        // Anthropic takes the system prompt as a top-level field
        let mut system_parts = Vec::new();
        let mut conversation_messages = Vec::new();

        for message in messages {
            match message.role {
                MessageRole::System => system_parts.push(message.content),
                _ => conversation_messages.push(message),
            }
        }

        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(1024),
            temperature: options.temperature.unwrap_or(0.7),
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            messages: conversation_messages,
            stop_sequences: options.stop,
        }
    }

    fn convert_response(&self, response: AnthropicResponse) -> LlmResponse {
        let text = response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        let finish_reason = response.stop_reason.map(|reason| match reason.as_str() {
            "end_turn" | "stop_sequence" => FinishReason::Stop,
            "max_tokens" => FinishReason::Length,
            _ => FinishReason::Other(reason),
        });

        LlmResponse {
            message: LlmMessage::assistant(text),
            usage,
            model: response.model,
            finish_reason,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<LlmMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicContent>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Protocol;

    fn client() -> AnthropicClient {
        let config = ResolvedLlmConfig::new(
            Protocol::Anthropic,
            "https://api.anthropic.com/".to_string(),
            "sk-ant-test".to_string(),
            "claude-3-5-haiku-20241022".to_string(),
        );
        AnthropicClient::new(&config).unwrap()
    }

    #[test]
    fn test_system_messages_are_lifted() {
        let request = client().build_request(
            vec![
                LlmMessage::system("You are a seller."),
                LlmMessage::user("I offer 500"),
            ],
            None,
        );

        assert_eq!(request.system.as_deref(), Some("You are a seller."));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert_eq!(request.max_tokens, 256);
    }

    #[test]
    fn test_response_text_blocks_joined() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{
                "model": "claude-3-5-haiku-20241022",
                "content": [{"type": "text", "text": "Deal at 640.\nDECISION: ACCEPT"}],
                "stop_reason": "end_turn",
                "usage": {"input_tokens": 120, "output_tokens": 12}
            }"#,
        )
        .unwrap();

        let converted = client().convert_response(response);
        assert_eq!(converted.message.text(), "Deal at 640.\nDECISION: ACCEPT");
        assert_eq!(converted.finish_reason, Some(FinishReason::Stop));
        assert_eq!(converted.usage.unwrap().total_tokens, 132);
    }
}
