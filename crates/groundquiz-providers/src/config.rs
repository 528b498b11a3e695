//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use groundquiz_core::fallback::BASIS_HINT_CHARS;
use groundquiz_core::relevance::LEXICAL_OFFSET;
use groundquiz_core::traits::LlmProvider;
use groundquiz_core::tutor::{MasteryPolicy, TutorConfig};
use groundquiz_core::GrounderConfig;

use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

/// Env var holding the Groq API key.
pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";
/// Env var overriding the default model.
pub const GROQ_MODEL_VAR: &str = "GROQ_MODEL";

/// Configuration for a single text-generation provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Groq {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    /// Canned reply for every prompt; useful for demos.
    Mock {
        #[serde(default)]
        response: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Groq {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Groq")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response_len", &response.len())
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Hosted providers need a key; an empty one means "not configured".
    pub fn is_usable(&self) -> bool {
        match self {
            ProviderConfig::OpenAI { api_key, .. } | ProviderConfig::Groq { api_key, .. } => {
                !api_key.trim().is_empty()
            }
            ProviderConfig::Ollama { .. } | ProviderConfig::Mock { .. } => true,
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Top-level groundquiz configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundquizConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used as the oracle.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model passed to the oracle.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature for quizzes and explanations.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Max tokens for quiz generation.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on a single oracle call, in seconds.
    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout_secs: u64,
    /// Calibration offset of the lexical relevance heuristic.
    #[serde(default = "default_lexical_offset")]
    pub lexical_offset: f64,
    /// Source characters quoted by the fallback quiz.
    #[serde(default = "default_basis_hint_chars")]
    pub basis_hint_chars: usize,
    /// Percentage needed to master a topic.
    #[serde(default = "default_mastery_threshold")]
    pub mastery_threshold: u8,
    /// Quiz attempts per learning session.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_provider() -> String {
    "groq".to_string()
}
fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}
fn default_temperature() -> f64 {
    0.3
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_oracle_timeout() -> u64 {
    60
}
fn default_lexical_offset() -> f64 {
    LEXICAL_OFFSET
}
fn default_basis_hint_chars() -> usize {
    BASIS_HINT_CHARS
}
fn default_mastery_threshold() -> u8 {
    70
}
fn default_max_attempts() -> u32 {
    3
}

impl Default for GroundquizConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            oracle_timeout_secs: default_oracle_timeout(),
            lexical_offset: default_lexical_offset(),
            basis_hint_chars: default_basis_hint_chars(),
            mastery_threshold: default_mastery_threshold(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl GroundquizConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    pub fn grounder_config(&self) -> GrounderConfig {
        GrounderConfig {
            model: self.default_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            oracle_timeout: self.oracle_timeout(),
            lexical_offset: self.lexical_offset,
            basis_hint_chars: self.basis_hint_chars,
        }
    }

    pub fn tutor_config(&self) -> TutorConfig {
        TutorConfig {
            model: self.default_model.clone(),
            temperature: self.temperature,
            oracle_timeout: self.oracle_timeout(),
            ..TutorConfig::default()
        }
    }

    pub fn mastery_policy(&self) -> MasteryPolicy {
        MasteryPolicy {
            threshold_percent: self.mastery_threshold.min(100),
            max_attempts: self.max_attempts.max(1),
        }
    }

    /// Build the configured oracle, or `None` when the default provider is
    /// missing or has no API key. Callers then run on the offline fallbacks.
    pub fn oracle(&self) -> Result<Option<Arc<dyn LlmProvider>>> {
        match self.providers.get(&self.default_provider) {
            Some(provider) if provider.is_usable() => {
                let boxed = create_provider(&self.default_provider, provider)?;
                Ok(Some(Arc::from(boxed)))
            }
            Some(_) => {
                tracing::warn!(
                    provider = %self.default_provider,
                    "provider has no API key, running without an oracle"
                );
                Ok(None)
            }
            None => {
                tracing::info!(
                    provider = %self.default_provider,
                    "provider not configured, running without an oracle"
                );
                Ok(None)
            }
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Single left-to-right pass: substituted values are never rescanned.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + 2 + len];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + 3 + len..];
    }
    result.push_str(rest);
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Groq { api_key, base_url } => ProviderConfig::Groq {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Apply `GROQ_API_KEY` / `GROQ_MODEL` overrides using `lookup` to read vars.
fn apply_env_overrides(config: &mut GroundquizConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(GROQ_API_KEY_VAR).filter(|k| !k.trim().is_empty()) {
        let entry = config
            .providers
            .entry("groq".into())
            .or_insert(ProviderConfig::Groq {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::Groq { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Some(model) = lookup(GROQ_MODEL_VAR).filter(|m| !m.trim().is_empty()) {
        config.default_model = model;
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `groundquiz.toml` in the current directory
/// 2. `~/.config/groundquiz/config.toml`
///
/// Environment variable overrides: `GROQ_API_KEY`, `GROQ_MODEL`.
pub fn load_config() -> Result<GroundquizConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<GroundquizConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("groundquiz.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => GroundquizConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok());

    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

/// Parse a TOML config document.
pub fn parse_config(content: &str) -> Result<GroundquizConfig> {
    let config: GroundquizConfig = toml::from_str(content)?;
    if !(0.0..=1.0).contains(&config.lexical_offset) {
        anyhow::bail!(
            "lexical_offset must be within 0.0..=1.0, got {}",
            config.lexical_offset
        );
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("groundquiz"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    tracing::debug!(provider = name, ?config, "creating provider");
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Box::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        ))),
        ProviderConfig::Groq { api_key, base_url } => {
            Ok(Box::new(OpenAiProvider::groq(api_key, base_url.clone())))
        }
        ProviderConfig::Ollama { base_url } => Ok(Box::new(OllamaProvider::new(base_url))),
        ProviderConfig::Mock { response } => Ok(Box::new(MockProvider::with_fixed_response(
            response,
        ))),
    }
}
