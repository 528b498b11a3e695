//! Mock provider for tests and offline demos.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use groundquiz_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage,
};

use crate::error::ProviderError;

/// What the mock does when called.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Fail as if the network were down.
    Fail(String),
}

/// A mock LLM provider.
///
/// Replies are matched first by prompt substring (in insertion order), then
/// taken from a queue; the default reply answers everything else.
pub struct MockProvider {
    /// Prompt substring → reply.
    rules: Vec<(String, MockReply)>,
    /// Replies consumed one per unmatched call.
    queue: Mutex<VecDeque<MockReply>>,
    /// Reply once rules and queue are exhausted.
    default_reply: MockReply,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a mock with prompt→response rules and an empty default.
    pub fn new(rules: Vec<(String, String)>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|(k, v)| (k, MockReply::Text(v)))
                .collect(),
            queue: Mutex::new(VecDeque::new()),
            default_reply: MockReply::Text(String::new()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self::new(Vec::new()).with_default(MockReply::Text(response.to_string()))
    }

    /// Create a mock whose every call fails.
    pub fn failing(message: &str) -> Self {
        Self::new(Vec::new()).with_default(MockReply::Fail(message.to_string()))
    }

    /// Create a mock that replays `responses` in order, then repeats the last.
    pub fn with_sequence(responses: &[&str]) -> Self {
        let mut queue: VecDeque<MockReply> = responses
            .iter()
            .map(|r| MockReply::Text(r.to_string()))
            .collect();
        let last = queue
            .pop_back()
            .unwrap_or_else(|| MockReply::Text(String::new()));
        let mock = Self::new(Vec::new()).with_default(last);
        *mock.queue.lock().unwrap_or_else(|e| e.into_inner()) = queue;
        mock
    }

    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Add a rule: prompts containing `needle` get `reply`.
    pub fn with_rule(mut self, needle: &str, reply: MockReply) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    /// Get the number of calls made to this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this provider.
    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn pick(&self, prompt: &str) -> MockReply {
        if let Some((_, reply)) = self.rules.iter().find(|(k, _)| prompt.contains(k.as_str())) {
            return reply.clone();
        }
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.default_reply.clone())
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());

        let content = match self.pick(&request.prompt) {
            MockReply::Text(text) => text,
            MockReply::Fail(message) => return Err(ProviderError::NetworkError(message).into()),
        };

        // Rough estimate
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "mock".into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("42");
        let response = provider.generate(&request("anything")).await.unwrap();
        assert_eq!(response.content, "42");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching_beats_queue() {
        let provider = MockProvider::with_sequence(&["first", "second"])
            .with_rule("Evaluate how well", MockReply::Text("77".into()));

        let resp = provider.generate(&request("Generate MCQs")).await.unwrap();
        assert_eq!(resp.content, "first");
        let resp = provider
            .generate(&request("Evaluate how well these MCQs"))
            .await
            .unwrap();
        assert_eq!(resp.content, "77");
        let resp = provider.generate(&request("again")).await.unwrap();
        assert_eq!(resp.content, "second");
        let resp = provider.generate(&request("and again")).await.unwrap();
        assert_eq!(resp.content, "second");
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn failing_mock_returns_provider_error() {
        let provider = MockProvider::failing("connection refused");
        let err = provider.generate(&request("x")).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert!(err.downcast_ref::<ProviderError>().is_some());
    }
}
