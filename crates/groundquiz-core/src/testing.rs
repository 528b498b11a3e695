//! In-crate oracle double for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::traits::{GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage};

enum Reply {
    Text(String),
    Error(String),
}

/// Replays queued replies in order; the last one repeats once the queue is
/// down to a single entry.
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Reply>>,
    delay: Option<Duration>,
    calls: AtomicU32,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn with_replies(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            delay: None,
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_replies(vec![Reply::Text(text.to_string())])
    }

    pub fn sequence(texts: &[&str]) -> Self {
        Self::with_replies(texts.iter().map(|t| Reply::Text(t.to_string())).collect())
    }

    pub fn failing(message: &str) -> Self {
        Self::with_replies(vec![Reply::Error(message.to_string())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().map(|r| match r {
                    Reply::Text(t) => Reply::Text(t.clone()),
                    Reply::Error(e) => Reply::Error(e.clone()),
                })
            }
        };

        match reply {
            Some(Reply::Text(content)) => Ok(GenerateResponse {
                content,
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 0,
            }),
            Some(Reply::Error(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no scripted reply")),
        }
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        Vec::new()
    }
}

/// A well-formed oracle payload with `count` questions about backpropagation.
pub fn mcq_payload(count: usize) -> String {
    let entries: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            serde_json::json!({
                "question": format!("What does backpropagation compute across layers? ({})", i + 1),
                "options": ["Gradients", "Weights only", "Labels", "Nothing"],
                "correct_index": 0,
                "explanation": "Backpropagation computes gradients via the chain rule."
            })
        })
        .collect();
    serde_json::json!({ "mcqs": entries }).to_string()
}
