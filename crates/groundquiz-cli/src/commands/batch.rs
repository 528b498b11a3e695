//! The `groundquiz batch` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use groundquiz_core::batch::{generate_batch, load_batch_file, BatchOutcome, BatchProgress};
use groundquiz_core::QuizGrounder;

use super::GlobalOpts;

/// Console progress reporter.
struct ConsoleReporter;

impl BatchProgress for ConsoleReporter {
    fn on_request_complete(&self, outcome: &BatchOutcome) {
        match &outcome.result {
            Ok(generated) => eprintln!(
                "  Done: [{}] {} ({}, relevance {})",
                outcome.index,
                outcome.topic,
                generated.quiz.origin(),
                generated.relevance
            ),
            Err(e) => eprintln!("  ERROR: [{}] {}: {e}", outcome.index, outcome.topic),
        }
    }

    fn on_batch_complete(&self, total: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {}/{total} succeeded, {failed} failed ({:.1}s)",
            total - failed,
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    opts: &GlobalOpts,
    topics: PathBuf,
    parallelism: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let requests = load_batch_file(&topics)?;
    anyhow::ensure!(
        !requests.is_empty(),
        "no [[requests]] found in {}",
        topics.display()
    );

    let (config, oracle) = opts.load()?;
    let grounder = QuizGrounder::new(oracle, config.grounder_config());

    eprintln!(
        "groundquiz v{}: generating {} quizzes (parallelism {parallelism})\n",
        env!("CARGO_PKG_VERSION"),
        requests.len()
    );
    let outcomes = generate_batch(&grounder, &requests, parallelism, &ConsoleReporter).await;

    print_summary(&outcomes);

    if let Some(dir) = output {
        std::fs::create_dir_all(&dir)?;
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
        let path = dir.join(format!("batch-{timestamp}.json"));
        let entries: Vec<serde_json::Value> = outcomes
            .iter()
            .map(|o| match &o.result {
                Ok(generated) => serde_json::json!({
                    "topic": o.topic,
                    "quiz": generated.quiz,
                    "relevance": generated.relevance,
                }),
                Err(e) => serde_json::json!({ "topic": o.topic, "error": e.to_string() }),
            })
            .collect();
        std::fs::write(&path, serde_json::to_string_pretty(&entries)?)?;
        eprintln!("Results saved to: {}", path.display());
    }

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    anyhow::ensure!(failed == 0, "{failed} of {} requests failed", outcomes.len());
    Ok(())
}

fn print_summary(outcomes: &[BatchOutcome]) {
    let mut table = Table::new();
    table.set_header(vec!["#", "Topic", "Quiz", "Relevance"]);

    for outcome in outcomes {
        let (origin, relevance) = match &outcome.result {
            Ok(generated) => (
                generated.quiz.origin().to_string(),
                generated.relevance.to_string(),
            ),
            Err(_) => ("error".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(outcome.index + 1),
            Cell::new(&outcome.topic),
            Cell::new(origin),
            Cell::new(relevance),
        ]);
    }

    println!("{table}");
}
