//! Ollama client implementation (native `/api/chat` endpoint)

use crate::config::{ModelParams, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, Usage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client for a locally hosted Ollama server
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    params: ModelParams,
    headers: HashMap<String, String>,
}

impl OllamaClient {
    /// Create a new Ollama client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            params: config.params.clone(),
            headers: config.headers.clone(),
        })
    }

    fn build_request(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> OllamaRequest {
        let options = options.unwrap_or_else(|| ChatOptions::from(&self.params));

        OllamaRequest {
            model: self.model.clone(),
            messages: messages
                .into_iter()
                .map(|m| OllamaMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content,
                })
                .collect(),
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                num_predict: options.max_tokens,
                stop: options.stop,
            },
        }
    }

    fn convert_response(&self, response: OllamaResponse) -> LlmResponse {
        let usage = match (response.prompt_eval_count, response.eval_count) {
            (Some(prompt), Some(completion)) => Some(Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };

        let finish_reason = response.done_reason.map(|reason| match reason.as_str() {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            _ => FinishReason::Other(reason),
        });

        LlmResponse {
            message: LlmMessage::assistant(response.message.content),
            usage,
            model: response.model,
            finish_reason,
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let request = self.build_request(messages, options);
        let url = format!("{}/api/chat", self.base_url);

        tracing::debug!("Ollama request to {} ({} messages)", url, request.messages.len());

        let mut builder = self.client.post(&url).json(&request);
        for (key, value) in &self.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| LlmError::Network {
            message: format!("Could not reach Ollama at {}: {}", self.base_url, e),
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotFound {
                model: self.model.clone(),
            }
            .into());
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message: error_text,
            }
            .into());
        }

        let ollama_response: OllamaResponse =
            response.json().await.map_err(|e| LlmError::Network {
                message: format!("Failed to parse response: {}", e),
            })?;

        Ok(self.convert_response(ollama_response))
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}
