//! The `groundquiz init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    write_if_missing(Path::new("groundquiz.toml"), SAMPLE_CONFIG)?;

    std::fs::create_dir_all("batches")?;
    write_if_missing(Path::new("batches/example.toml"), EXAMPLE_BATCH)?;

    println!("\nNext steps:");
    println!("  1. export GROQ_API_KEY=... (or edit groundquiz.toml)");
    println!("  2. Run: groundquiz learn --topic \"Backpropagation\"");
    println!("  3. Run: groundquiz batch --topics batches/example.toml");

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        println!("{} already exists, skipping.", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("Created {}", path.display());
    }
    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# groundquiz configuration

default_provider = "groq"
default_model = "llama-3.1-8b-instant"
temperature = 0.3
max_tokens = 2048
oracle_timeout_secs = 60

# Relevance heuristic and fallback quiz
lexical_offset = 0.35
basis_hint_chars = 160

# Tutoring loop
mastery_threshold = 70
max_attempts = 3

[providers.groq]
type = "groq"
api_key = "${GROQ_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"
"#;

const EXAMPLE_BATCH: &str = r#"# One quiz per [[requests]] entry.

[[requests]]
topic = "Backpropagation"
source = """
Backpropagation computes the gradient of the loss with respect to every weight
by applying the chain rule backwards through the layers of a neural network.
The gradients are then used by gradient descent to update the weights.
"""

[[requests]]
topic = "TCP three-way handshake"
difficulty = "easy"
source = """
TCP opens a connection with a three-way handshake: the client sends SYN, the
server answers SYN-ACK, and the client confirms with ACK. Both sides agree on
initial sequence numbers during the handshake.
"""
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses() {
        let config = groundquiz_providers::config::parse_config(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.providers.len(), 3);
    }

    #[test]
    fn example_batch_parses() {
        let requests =
            groundquiz_core::batch::parse_batch_str(EXAMPLE_BATCH, Path::new(".")).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].difficulty, groundquiz_core::Difficulty::Easy);
    }
}
