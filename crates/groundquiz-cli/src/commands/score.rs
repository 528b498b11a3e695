//! The `groundquiz score` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

use groundquiz_core::model::Question;
use groundquiz_core::QuizGrounder;

use super::{read_text, GlobalOpts};

pub async fn execute(opts: &GlobalOpts, source: PathBuf, quiz_path: PathBuf) -> Result<()> {
    let (config, oracle) = opts.load()?;
    let source_text = read_text(&source)?;
    let questions = parse_questions(&read_text(&quiz_path)?)
        .with_context(|| format!("invalid quiz file: {}", quiz_path.display()))?;

    let grounder = QuizGrounder::new(oracle, config.grounder_config());
    let score = grounder.score_relevance(&source_text, &questions).await;

    println!("Relevance: {score}");
    Ok(())
}

/// Accept `quiz --json` output, a bare quiz object, or a question array.
fn parse_questions(content: &str) -> Result<Vec<Question>> {
    let mut value: Value = serde_json::from_str(content).context("quiz file is not JSON")?;
    if let Some(inner) = value.get_mut("quiz") {
        value = inner.take();
    }
    if let Some(list) = value.get_mut("questions") {
        value = list.take();
    }
    anyhow::ensure!(value.is_array(), "expected a list of questions");
    Ok(serde_json::from_value(value)?)
}
