//! groundquiz-providers — Text-generation oracle integrations.
//!
//! Implements the `LlmProvider` trait for OpenAI-compatible endpoints
//! (OpenAI, Groq) and Ollama, plus a scriptable mock, and loads the
//! `groundquiz.toml` configuration that selects between them.

pub mod config;
pub mod error;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use config::{create_provider, load_config, load_config_from, GroundquizConfig, ProviderConfig};
pub use error::ProviderError;
pub use mock::{MockProvider, MockReply};
