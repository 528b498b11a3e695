//! OpenAI-compatible chat completion provider (OpenAI, Groq, and any other
//! service exposing `/v1/chat/completions`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use groundquiz_core::traits::{
    GenerateRequest, GenerateResponse, LlmProvider, ModelInfo, TokenUsage, DEFAULT_SYSTEM_PROMPT,
};

use crate::error::ProviderError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Which hosted flavour the provider talks to. Only affects naming and the
/// advertised model list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    OpenAi,
    Groq,
}

/// OpenAI-compatible API provider.
pub struct OpenAiProvider {
    flavor: Flavor,
    api_key: String,
    base_url: String,
    org_id: Option<String>,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, base_url: Option<String>, org_id: Option<String>) -> Self {
        Self::with_flavor(Flavor::OpenAi, api_key, base_url, org_id)
    }

    /// Provider pointed at Groq's OpenAI-compatible endpoint.
    pub fn groq(api_key: &str, base_url: Option<String>) -> Self {
        Self::with_flavor(Flavor::Groq, api_key, base_url, None)
    }

    fn with_flavor(
        flavor: Flavor,
        api_key: &str,
        base_url: Option<String>,
        org_id: Option<String>,
    ) -> Self {
        let default_base = match flavor {
            Flavor::OpenAi => OPENAI_BASE_URL,
            Flavor::Groq => GROQ_BASE_URL,
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("failed to build HTTP client");

        Self {
            flavor,
            api_key: api_key.to_string(),
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| default_base.to_string()),
            org_id,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            client,
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: ChatUsage,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        match self.flavor {
            Flavor::OpenAi => "openai",
            Flavor::Groq => "groq",
        }
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        let start = Instant::now();

        let system_prompt = request
            .system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let body = ChatRequest {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: request.prompt.clone(),
                },
            ],
        };

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json");

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(5)
                * 1000;
            return Err(ProviderError::RateLimited {
                retry_after_ms: retry_after,
            }
            .into());
        }
        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(body).into());
        }
        if status == 404 {
            return Err(ProviderError::ModelNotFound(request.model.clone()).into());
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status,
                message: body,
            }
            .into());
        }

        let api_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse("no choices in response".into()))?;

        Ok(GenerateResponse {
            content,
            model: api_response.model.unwrap_or_else(|| request.model.clone()),
            token_usage: TokenUsage {
                prompt_tokens: api_response.usage.prompt_tokens,
                completion_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        let provider = self.name().to_string();
        let models: &[(&str, &str, u32)] = match self.flavor {
            Flavor::Groq => &[
                ("llama-3.1-8b-instant", "Llama 3.1 8B Instant", 131_072),
                ("llama-3.3-70b-versatile", "Llama 3.3 70B Versatile", 131_072),
                ("openai/gpt-oss-120b", "GPT-OSS 120B", 131_072),
            ],
            Flavor::OpenAi => &[
                ("gpt-4.1", "GPT-4.1", 1_000_000),
                ("gpt-4.1-mini", "GPT-4.1 Mini", 1_000_000),
                ("gpt-4.1-nano", "GPT-4.1 Nano", 1_000_000),
            ],
        };
        models
            .iter()
            .map(|(id, name, max_context)| ModelInfo {
                id: id.to_string(),
                name: name.to_string(),
                provider: provider.clone(),
                max_context: *max_context,
            })
            .collect()
    }
}
