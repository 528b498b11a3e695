//! Concurrent quiz generation for many topics at once.
//!
//! Requests are loaded from a TOML file and run with bounded parallelism
//! against a shared [`QuizGrounder`].

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::error::QuizError;
use crate::grounder::{GeneratedQuiz, QuizGrounder};
use crate::model::Difficulty;

/// One quiz to generate.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub topic: String,
    pub source_text: String,
    pub difficulty: Difficulty,
}

/// Result for one request, tagged with its position in the input.
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    pub topic: String,
    pub result: Result<GeneratedQuiz, QuizError>,
}

/// Progress reporting for batch runs.
pub trait BatchProgress: Send + Sync {
    fn on_request_complete(&self, outcome: &BatchOutcome);
    fn on_batch_complete(&self, total: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopProgress;

impl BatchProgress for NoopProgress {
    fn on_request_complete(&self, _: &BatchOutcome) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// Generate every request with at most `parallelism` in flight.
///
/// Outcomes come back in request order. A contract violation only fails its
/// own entry.
pub async fn generate_batch(
    grounder: &QuizGrounder,
    requests: &[BatchRequest],
    parallelism: usize,
    progress: &dyn BatchProgress,
) -> Vec<BatchOutcome> {
    let start = Instant::now();
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));

    let mut futures = FuturesUnordered::new();
    for (index, request) in requests.iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        futures.push(async move {
            // The semaphore is never closed, so acquire only fails on a bug.
            let _permit = semaphore.acquire_owned().await.ok();
            let result = grounder
                .generate_quiz(&request.topic, &request.source_text, request.difficulty)
                .await;
            BatchOutcome {
                index,
                topic: request.topic.clone(),
                result,
            }
        });
    }

    let mut outcomes = Vec::with_capacity(requests.len());
    let mut failed = 0usize;
    while let Some(outcome) = futures.next().await {
        if let Err(e) = &outcome.result {
            tracing::error!("batch request {} ({}) failed: {e}", outcome.index, outcome.topic);
            failed += 1;
        }
        progress.on_request_complete(&outcome);
        outcomes.push(outcome);
    }

    progress.on_batch_complete(requests.len(), failed, start.elapsed());
    outcomes.sort_by_key(|o| o.index);
    outcomes
}

// ---------------------------------------------------------------------------
// TOML batch files
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TomlBatchFile {
    #[serde(default)]
    requests: Vec<TomlBatchRequest>,
}

#[derive(Debug, Deserialize)]
struct TomlBatchRequest {
    topic: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    source_file: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

/// Parse a batch file. `source_file` paths resolve against `base_dir`.
pub fn parse_batch_str(content: &str, base_dir: &Path) -> Result<Vec<BatchRequest>> {
    let file: TomlBatchFile = toml::from_str(content).context("failed to parse batch TOML")?;

    file.requests
        .into_iter()
        .enumerate()
        .map(|(i, req)| {
            let source_text = match (req.source, req.source_file) {
                (Some(text), None) => text,
                (None, Some(rel)) => {
                    let path = base_dir.join(&rel);
                    std::fs::read_to_string(&path).with_context(|| {
                        format!("request {i}: failed to read source file {}", path.display())
                    })?
                }
                (None, None) => String::new(),
                (Some(_), Some(_)) => {
                    anyhow::bail!("request {i}: set either `source` or `source_file`, not both")
                }
            };
            let difficulty = match req.difficulty {
                Some(d) => d
                    .parse::<Difficulty>()
                    .map_err(|e| anyhow::anyhow!("request {i}: {e}"))?,
                None => Difficulty::Normal,
            };
            Ok(BatchRequest {
                topic: req.topic,
                source_text,
                difficulty,
            })
        })
        .collect()
}

/// Load a batch file from disk.
pub fn load_batch_file(path: &Path) -> Result<Vec<BatchRequest>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file: {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_batch_str(&content, base_dir)
        .with_context(|| format!("invalid batch file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grounder::GrounderConfig;
    use crate::model::QUIZ_LENGTH;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProgress {
        completed: AtomicUsize,
        failed: AtomicUsize,
    }

    impl BatchProgress for CountingProgress {
        fn on_request_complete(&self, _: &BatchOutcome) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
        fn on_batch_complete(&self, _: usize, failed: usize, _: Duration) {
            self.failed.store(failed, Ordering::Relaxed);
        }
    }

    fn request(topic: &str) -> BatchRequest {
        BatchRequest {
            topic: topic.into(),
            source_text: format!("{topic} is explained here in detail."),
            difficulty: Difficulty::Normal,
        }
    }

    #[tokio::test]
    async fn outcomes_keep_request_order_and_isolate_failures() {
        let grounder = QuizGrounder::offline(GrounderConfig::default());
        let requests = vec![request("Stacks"), request(""), request("Queues"), request("Heaps")];
        let progress = CountingProgress {
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        };

        let outcomes = generate_batch(&grounder, &requests, 2, &progress).await;

        assert_eq!(outcomes.len(), 4);
        let topics: Vec<&str> = outcomes.iter().map(|o| o.topic.as_str()).collect();
        assert_eq!(topics, vec!["Stacks", "", "Queues", "Heaps"]);
        assert!(outcomes[1].result.is_err());
        for i in [0, 2, 3] {
            let generated = outcomes[i].result.as_ref().unwrap();
            assert_eq!(generated.quiz.questions().len(), QUIZ_LENGTH);
        }
        assert_eq!(progress.completed.load(Ordering::Relaxed), 4);
        assert_eq!(progress.failed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn zero_parallelism_still_runs() {
        let grounder = QuizGrounder::offline(GrounderConfig::default());
        let outcomes = generate_batch(&grounder, &[request("Tries")], 0, &NoopProgress).await;
        assert!(outcomes[0].result.is_ok());
    }

    #[test]
    fn parse_inline_and_file_sources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("graphs.md"), "Graphs have vertices.").unwrap();
        let toml = r#"
[[requests]]
topic = "Sorting"
source = "Sorting orders elements."
difficulty = "easy"

[[requests]]
topic = "Graphs"
source_file = "graphs.md"
"#;
        let requests = parse_batch_str(toml, dir.path()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].difficulty, Difficulty::Easy);
        assert_eq!(requests[1].source_text, "Graphs have vertices.");
        assert_eq!(requests[1].difficulty, Difficulty::Normal);
    }

    #[test]
    fn parse_rejects_conflicting_sources_and_bad_difficulty() {
        let both = r#"
[[requests]]
topic = "X"
source = "a"
source_file = "b.md"
"#;
        assert!(parse_batch_str(both, Path::new(".")).is_err());

        let bad = r#"
[[requests]]
topic = "X"
difficulty = "brutal"
"#;
        assert!(parse_batch_str(bad, Path::new(".")).is_err());
    }

    #[test]
    fn load_missing_file_fails() {
        assert!(load_batch_file(Path::new("does-not-exist.toml")).is_err());
    }
}
