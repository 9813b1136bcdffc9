//! Scripted client that replays a fixed sequence of completions
//!
//! Used to drive the dialogue loop deterministically without a model server.

use crate::error::{LlmError, Result};
use crate::llm::{ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One scripted step
#[derive(Debug, Clone)]
pub enum ScriptStep {
    /// Return this completion text
    Reply(String),
    /// Fail as if the model server was unreachable
    Fail(String),
    /// Wait before replying (exercises request timeouts)
    Delayed(Duration, String),
}

/// LLM client returning scripted completions in order
pub struct ScriptedClient {
    steps: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<Vec<LlmMessage>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedClient {
    /// Create a client from explicit steps
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a client that answers with each reply in turn
    pub fn from_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|r| ScriptStep::Reply(r.into())))
    }

    /// Number of completions requested so far
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every message list sent to the client, in order
    pub fn requests(&self) -> Vec<Vec<LlmMessage>> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        let calls = {
            let mut requests = lock(&self.requests);
            requests.push(messages);
            requests.len()
        };

        let step = lock(&self.steps).pop_front();
        let text = match step {
            Some(ScriptStep::Reply(text)) => text,
            Some(ScriptStep::Fail(message)) => return Err(LlmError::Network { message }.into()),
            Some(ScriptStep::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                text
            }
            None => return Err(LlmError::ScriptExhausted { calls: calls - 1 }.into()),
        };

        Ok(LlmResponse {
            message: LlmMessage::assistant(text),
            usage: None,
            model: "scripted".to_string(),
            finish_reason: Some(FinishReason::Stop),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order_then_exhausts() {
        let client = ScriptedClient::from_replies(["first", "second"]);

        let first = tokio_test::block_on(client.chat_completion(vec![LlmMessage::user("a")], None))
            .unwrap();
        let second =
            tokio_test::block_on(client.chat_completion(vec![LlmMessage::user("b")], None))
                .unwrap();
        assert_eq!(first.message.text(), "first");
        assert_eq!(second.message.text(), "second");

        let exhausted = tokio_test::block_on(client.chat_completion(vec![], None));
        assert!(matches!(
            exhausted,
            Err(crate::error::Error::Llm(LlmError::ScriptExhausted { calls: 2 }))
        ));
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn test_records_requests() {
        let client = ScriptedClient::new([ScriptStep::Fail("connection refused".to_string())]);
        let result = tokio_test::block_on(
            client.chat_completion(vec![LlmMessage::system("persona"), LlmMessage::user("hi")], None),
        );

        assert!(result.is_err());
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][1].text(), "hi");
    }
}
