//! OpenAI-compatible client implementation using async-openai library

use crate::config::{ModelParams, ResolvedLlmConfig};
use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, Usage};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs, Stop,
    },
    Client,
};
use async_trait::async_trait;

/// OpenAI-compatible client (OpenAI itself, proxies, local servers)
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
    params: ModelParams,
}

impl OpenAiClient {
    /// Create a new OpenAI client from resolved LLM config
    pub fn new(config: &ResolvedLlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Authentication {
                message: "No API key found for OpenAI".to_string(),
            }
            .into());
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(config.base_url.trim_end_matches('/'));

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        let client = Client::with_config(openai_config).with_http_client(http_client);

        Ok(Self {
            client,
            model: config.model.clone(),
            params: config.params.clone(),
        })
    }

    /// Convert our internal message format to async-openai format
    fn convert_messages(&self, messages: Vec<LlmMessage>) -> Vec<ChatCompletionRequestMessage> {
        messages
            .into_iter()
            .map(|message| match message.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: message.content.into(),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                        content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                            message.content,
                        )),
                        name: None,
                        tool_calls: None,
                        audio: None,
                        refusal: None,
                        ..Default::default()
                    })
                }
            })
            .collect()
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    #[allow(deprecated)]
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let options = options.unwrap_or_else(|| ChatOptions::from(&self.params));

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(&self.model);
        request_builder.messages(self.convert_messages(messages));

        if let Some(max_tokens) = options.max_tokens {
            request_builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = options.temperature {
            request_builder.temperature(temperature);
        }
        if let Some(top_p) = options.top_p {
            request_builder.top_p(top_p);
        }
        if let Some(stop) = options.stop {
            request_builder.stop(Stop::StringArray(stop));
        }

        let request = request_builder.build().map_err(|e| {
            tracing::error!("Failed to build OpenAI request: {}", e);
            LlmError::InvalidRequest {
                message: format!("Failed to build request: {}", e),
            }
        })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!("OpenAI API call failed: {}", e);
            LlmError::ApiError {
                status: 500, // async-openai doesn't expose status codes directly
                message: e.to_string(),
            }
        })?;

        self.convert_response(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        "openai"
    }
}

impl OpenAiClient {
    /// Convert async-openai response to our internal format
    fn convert_response(
        &self,
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> Result<LlmResponse> {
        let choice =
            response
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| LlmError::InvalidRequest {
                    message: "No choices in response".to_string(),
                })?;

        let message = LlmMessage::assistant(choice.message.content.unwrap_or_default());

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let finish_reason = choice.finish_reason.map(|reason| match reason {
            async_openai::types::FinishReason::Stop => FinishReason::Stop,
            async_openai::types::FinishReason::Length => FinishReason::Length,
            async_openai::types::FinishReason::ContentFilter => FinishReason::ContentFilter,
            other => FinishReason::Other(format!("{:?}", other)),
        });

        Ok(LlmResponse {
            message,
            usage,
            model: response.model,
            finish_reason,
        })
    }
}
