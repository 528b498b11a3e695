//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use groundquiz_core::model::Question;
use groundquiz_core::traits::LlmProvider;
use groundquiz_providers::config::load_config_from;
use groundquiz_providers::GroundquizConfig;

pub mod batch;
pub mod init;
pub mod learn;
pub mod list_models;
pub mod quiz;
pub mod score;

/// Flags shared by every subcommand.
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub offline: bool,
}

impl GlobalOpts {
    /// Load the config and build the oracle, unless running offline.
    pub fn load(&self) -> Result<(GroundquizConfig, Option<Arc<dyn LlmProvider>>)> {
        let config = load_config_from(self.config.as_deref())?;
        let oracle = if self.offline {
            tracing::info!("offline mode, no oracle");
            None
        } else {
            config.oracle()?
        };
        Ok((config, oracle))
    }
}

/// Read a UTF-8 text file with a readable error.
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Print a question with 1-based option numbers.
pub fn print_question(number: usize, question: &Question) {
    println!("Q{number}. {}", question.text());
    for (i, option) in question.options().iter().enumerate() {
        println!("   {}) {option}", i + 1);
    }
}
