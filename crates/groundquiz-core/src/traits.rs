//! The text-generation oracle trait and the request/response types around it.
//!
//! Implementations live in the `groundquiz-providers` crate. The core only
//! ever talks to an oracle through [`ask_oracle`], which folds every kind of
//! failure (error, timeout, empty answer) into an [`OracleOutcome`].

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OracleFailure;

// ---------------------------------------------------------------------------
// LLM Provider trait
// ---------------------------------------------------------------------------

/// Trait for LLM backends that turn a prompt into text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g. "groq").
    fn name(&self) -> &str;

    /// Generate text from a prompt.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// List models known to this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request to generate text from an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "llama-3.1-8b-instant").
    pub model: String,
    /// The main prompt.
    pub prompt: String,
    /// Optional system prompt override.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from an LLM generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

/// Default system prompt for oracle calls.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a precise engineering tutor. Follow the requested output format exactly and never add content that the user did not ask for.";

// ---------------------------------------------------------------------------
// Oracle call outcome
// ---------------------------------------------------------------------------

/// Result of a single oracle round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleOutcome {
    /// Non-empty text, trimmed.
    Success(String),
    /// Anything else.
    Failure(OracleFailure),
}

impl OracleOutcome {
    pub fn into_result(self) -> Result<String, OracleFailure> {
        match self {
            OracleOutcome::Success(text) => Ok(text),
            OracleOutcome::Failure(reason) => Err(reason),
        }
    }
}

/// Call the oracle once, bounded by `timeout`.
///
/// Never returns an error: provider errors, an elapsed timeout and an empty
/// answer all become [`OracleOutcome::Failure`].
pub async fn ask_oracle(
    oracle: &dyn LlmProvider,
    request: &GenerateRequest,
    timeout: Duration,
) -> OracleOutcome {
    let start = Instant::now();
    let outcome = match tokio::time::timeout(timeout, oracle.generate(request)).await {
        Err(_) => OracleOutcome::Failure(OracleFailure::Timeout(timeout)),
        Ok(Err(e)) => OracleOutcome::Failure(OracleFailure::Request(format!("{e:#}"))),
        Ok(Ok(response)) => {
            let text = response.content.trim();
            if text.is_empty() {
                OracleOutcome::Failure(OracleFailure::Malformed("empty response".into()))
            } else {
                OracleOutcome::Success(text.to_string())
            }
        }
    };
    tracing::debug!(
        provider = oracle.name(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        ok = matches!(outcome, OracleOutcome::Success(_)),
        "oracle call finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedOracle;

    fn request() -> GenerateRequest {
        GenerateRequest {
            model: "test".into(),
            prompt: "hello".into(),
            system_prompt: None,
            max_tokens: 16,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn success_is_trimmed() {
        let oracle = ScriptedOracle::replying("  hi there \n");
        let outcome = ask_oracle(&oracle, &request(), Duration::from_secs(1)).await;
        assert_eq!(outcome, OracleOutcome::Success("hi there".into()));
    }

    #[tokio::test]
    async fn provider_error_becomes_failure() {
        let oracle = ScriptedOracle::failing("authentication failed: bad key");
        let outcome = ask_oracle(&oracle, &request(), Duration::from_secs(1)).await;
        match outcome {
            OracleOutcome::Failure(OracleFailure::Request(msg)) => {
                assert!(msg.contains("authentication"))
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_answer_is_malformed() {
        let oracle = ScriptedOracle::replying("   ");
        let outcome = ask_oracle(&oracle, &request(), Duration::from_secs(1)).await;
        assert!(matches!(
            outcome,
            OracleOutcome::Failure(OracleFailure::Malformed(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_oracle_times_out() {
        let oracle = ScriptedOracle::replying("late").with_delay(Duration::from_secs(30));
        let outcome = ask_oracle(&oracle, &request(), Duration::from_secs(5)).await;
        assert_eq!(
            outcome,
            OracleOutcome::Failure(OracleFailure::Timeout(Duration::from_secs(5)))
        );
    }
}
