//! Mock LLM provider for testing
//!
//! Replies are scripted: each `chat()` call consumes the next queued outcome,
//! falling back to a fixed default once the queue is drained. Every call is
//! counted and its messages captured for later assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::providers::{LlmMessage, LlmProvider, LlmResponse, ProviderError, SamplingOptions};

/// Mock provider for testing
pub struct MockLlmProvider {
    /// Outcomes returned in order, one per call
    script: Arc<Mutex<VecDeque<Result<LlmResponse, ProviderError>>>>,
    /// Returned once the script is exhausted
    fallback: Arc<Mutex<LlmResponse>>,
    /// Artificial latency applied before replying
    delay: Option<Duration>,
    default_model: String,
    name: &'static str,
    call_count: Arc<Mutex<usize>>,
    /// Messages received by every call, oldest first
    received: Arc<Mutex<Vec<Vec<LlmMessage>>>>,
}

impl MockLlmProvider {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(LlmResponse::new("Mock response"))),
            delay: None,
            default_model: "mock-model".to_string(),
            name: "MockProvider",
            call_count: Arc::new(Mutex::new(0)),
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sets the reply returned when nothing is queued
    pub fn set_response(&self, content: impl Into<String>) {
        *self.fallback.lock().unwrap() = LlmResponse::new(content);
    }

    /// Queues a successful reply
    pub fn push_response(&self, content: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::new(content)));
    }

    /// Queues an error
    pub fn push_error(&self, error: ProviderError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    /// Makes every call wait `delay` before replying
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of times chat() was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Returns the messages passed to the most recent chat() call
    pub fn last_messages(&self) -> Option<Vec<LlmMessage>> {
        self.received.lock().unwrap().last().cloned()
    }

    /// Returns the messages of every call
    pub fn all_messages(&self) -> Vec<Vec<LlmMessage>> {
        self.received.lock().unwrap().clone()
    }
}

impl Default for MockLlmProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockLlmProvider {
    async fn chat(
        &self,
        messages: Vec<LlmMessage>,
        _options: &SamplingOptions,
        _model: &str,
    ) -> Result<LlmResponse, ProviderError> {
        *self.call_count.lock().unwrap() += 1;
        self.received.lock().unwrap().push(messages);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => Ok(self.fallback.lock().unwrap().clone()),
        }
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_replays_script_in_order() {
        let mock = MockLlmProvider::new();
        mock.push_response("first");
        mock.push_error(ProviderError::network("down"));
        mock.set_response("fallback");

        let options = SamplingOptions::default();
        let first = mock.chat(vec![], &options, "m").await.unwrap();
        assert_eq!(first.content, "first");

        let second = mock.chat(vec![], &options, "m").await;
        assert!(second.unwrap_err().to_string().contains("Network error"));

        let third = mock.chat(vec![], &options, "m").await.unwrap();
        assert_eq!(third.content, "fallback");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_provider_tracks_messages() {
        let mock = MockLlmProvider::new();
        let messages = vec![LlmMessage::system("System prompt"), LlmMessage::user("Hi")];
        mock.chat(messages, &SamplingOptions::default(), "m")
            .await
            .unwrap();

        let last = mock.last_messages().unwrap();
        assert_eq!(last.len(), 2);
        assert_eq!(last[0].content, "System prompt");
        assert_eq!(mock.all_messages().len(), 1);
    }

    #[test]
    fn test_mock_implements_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockLlmProvider>();
    }
}
