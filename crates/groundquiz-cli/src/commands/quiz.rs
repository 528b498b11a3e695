//! The `groundquiz quiz` command.

use std::path::PathBuf;

use anyhow::Result;

use groundquiz_core::tutor::Tutor;
use groundquiz_core::{Difficulty, QuizGrounder};

use super::{print_question, read_text, GlobalOpts};

pub async fn execute(
    opts: &GlobalOpts,
    topic: String,
    source: Option<PathBuf>,
    explain: bool,
    difficulty: Difficulty,
    json: bool,
) -> Result<()> {
    anyhow::ensure!(!topic.trim().is_empty(), "topic must not be empty");
    let (config, oracle) = opts.load()?;

    let source_text = match source {
        Some(path) => read_text(&path)?,
        None if explain => {
            let tutor = Tutor::new(oracle.clone(), config.tutor_config());
            let text = tutor.explain(&topic).await?;
            if !json {
                println!("{text}\n");
            }
            text
        }
        None => anyhow::bail!("either --source or --explain is required"),
    };

    let grounder = QuizGrounder::new(oracle, config.grounder_config());
    let generated = grounder
        .generate_quiz(&topic, &source_text, difficulty)
        .await?;

    if json {
        let doc = serde_json::json!({
            "topic": topic.trim(),
            "difficulty": difficulty,
            "quiz": generated.quiz,
            "relevance": generated.relevance,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!(
        "Quiz: {} ({} questions, {difficulty}, source: {})\n",
        topic.trim(),
        generated.quiz.questions().len(),
        generated.quiz.origin()
    );
    for (i, question) in generated.quiz.questions().iter().enumerate() {
        print_question(i + 1, question);
        println!();
    }
    let key: Vec<String> = generated
        .quiz
        .answer_key()
        .iter()
        .map(|a| (a + 1).to_string())
        .collect();
    println!("Answer key: {}", key.join(" "));
    println!("Relevance: {}", generated.relevance);

    Ok(())
}
