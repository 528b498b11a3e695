//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SOURCE: &str = "Backpropagation computes gradients via the chain rule across layers.";

/// Binary isolated from any user config or API key.
fn groundquiz(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("groundquiz").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("GROQ_API_KEY")
        .env_remove("GROQ_MODEL")
        .env("RUST_LOG", "groundquiz=warn");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn only_file_in(dir: &Path) -> std::path::PathBuf {
    let entries: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1, "expected exactly one file in {}", dir.display());
    entries.into_iter().next().unwrap()
}

#[test]
fn quiz_offline_json_is_fallback() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "source.txt", SOURCE);

    let output = groundquiz(dir.path())
        .args(["--offline", "quiz", "--topic", "Backpropagation"])
        .args(["--source", "source.txt", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(doc["topic"], "Backpropagation");
    assert_eq!(doc["quiz"]["origin"], "fallback");
    let questions = doc["quiz"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 10);
    assert!(questions
        .iter()
        .all(|q| q["options"].as_array().unwrap().len() == 4));
    assert!(questions[0]["question"]
        .as_str()
        .unwrap()
        .contains("Based on the provided explanation: Backpropagation"));
    let relevance = doc["relevance"].as_u64().unwrap();
    assert!(relevance <= 100);
}

#[test]
fn quiz_text_output_has_answer_key() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "source.txt", SOURCE);

    groundquiz(dir.path())
        .args(["--offline", "quiz", "--topic", "Backpropagation", "--source", "source.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Q10."))
        .stdout(predicate::str::contains("Answer key: 1 1 1 1 1 1 1 1 1 1"))
        .stdout(predicate::str::contains("source: fallback"));
}

#[test]
fn quiz_requires_source_or_explain() {
    let dir = TempDir::new().unwrap();

    groundquiz(dir.path())
        .args(["--offline", "quiz", "--topic", "Backpropagation"])
        .assert()
        .failure();
}

#[test]
fn quiz_on_generated_explanation() {
    let dir = TempDir::new().unwrap();

    groundquiz(dir.path())
        .args(["--offline", "quiz", "--topic", "Hash tables", "--explain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hash tables"))
        .stdout(predicate::str::contains("Relevance:"));
}

#[test]
fn quiz_rejects_blank_topic() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "source.txt", SOURCE);

    groundquiz(dir.path())
        .args(["--offline", "quiz", "--topic", "  ", "--source", "source.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("topic must not be empty"));
}

#[test]
fn score_verbatim_quiz_is_fully_grounded() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "source.txt", SOURCE);
    let question = serde_json::json!({
        "question": "Backpropagation computes gradients",
        "options": ["chain rule", "across layers", "gradients", "Backpropagation"],
        "correct_index": 0
    });
    let quiz = serde_json::Value::Array(vec![question; 10]);
    write(dir.path(), "quiz.json", &quiz.to_string());

    groundquiz(dir.path())
        .args(["--offline", "score", "--source", "source.txt", "--quiz", "quiz.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Relevance: 100%"));
}

#[test]
fn score_empty_quiz_is_zero() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "source.txt", SOURCE);
    write(dir.path(), "quiz.json", "[]");

    groundquiz(dir.path())
        .args(["--offline", "score", "--source", "source.txt", "--quiz", "quiz.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Relevance: 0%"));
}

#[test]
fn quiz_json_round_trips_into_score() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "source.txt", SOURCE);

    let output = groundquiz(dir.path())
        .args(["--offline", "quiz", "--topic", "Backpropagation"])
        .args(["--source", "source.txt", "--json"])
        .output()
        .unwrap();
    std::fs::write(dir.path().join("quiz.json"), &output.stdout).unwrap();

    groundquiz(dir.path())
        .args(["--offline", "score", "--source", "source.txt", "--quiz", "quiz.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Relevance:"));
}

#[test]
fn learn_offline_mastered_on_first_attempt() {
    let dir = TempDir::new().unwrap();
    let sessions = dir.path().join("sessions");

    groundquiz(dir.path())
        .args(["--offline", "learn", "--topic", "Backpropagation", "--output"])
        .arg(&sessions)
        .write_stdin("1\n".repeat(10))
        .assert()
        .success()
        .stdout(predicate::str::contains("Score: 10/10 (100%)"))
        .stdout(predicate::str::contains("Mastered!"))
        .stdout(predicate::str::contains("mastered"));

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(only_file_in(&sessions)).unwrap()).unwrap();
    assert_eq!(record["topic"], "Backpropagation");
    assert_eq!(record["outcome"], "mastered");
    assert_eq!(record["attempts"].as_array().unwrap().len(), 1);
}

#[test]
fn learn_offline_exhausts_attempts() {
    let dir = TempDir::new().unwrap();
    let sessions = dir.path().join("sessions");

    groundquiz(dir.path())
        .args(["--offline", "learn", "--topic", "Backpropagation", "--output"])
        .arg(&sessions)
        .write_stdin("2\n".repeat(30))
        .assert()
        .success()
        .stdout(predicate::str::contains("Let's try a simpler explanation."))
        .stdout(predicate::str::contains("Not mastered after 3 attempts"));

    let record: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(only_file_in(&sessions)).unwrap()).unwrap();
    assert_eq!(record["outcome"], "exhausted");
    let attempts = record["attempts"].as_array().unwrap();
    assert_eq!(attempts.len(), 3);
    assert_eq!(attempts[0]["difficulty"], "normal");
    assert_eq!(attempts[1]["difficulty"], "easy");
}

#[test]
fn learn_fails_when_input_runs_out() {
    let dir = TempDir::new().unwrap();

    groundquiz(dir.path())
        .args(["--offline", "learn", "--topic", "Backpropagation"])
        .write_stdin("1\n1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input ended"));
}

#[test]
fn batch_offline_generates_every_request() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "notes.txt", SOURCE);
    write(
        dir.path(),
        "topics.toml",
        r#"
[[requests]]
topic = "Backpropagation"
source_file = "notes.txt"

[[requests]]
topic = "Heaps"
source = "A binary heap keeps the smallest element at the root."
difficulty = "easy"
"#,
    );
    let out = dir.path().join("out");

    groundquiz(dir.path())
        .args(["--offline", "batch", "--topics", "topics.toml", "--parallelism", "2"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Backpropagation"))
        .stdout(predicate::str::contains("Heaps"))
        .stderr(predicate::str::contains("2/2 succeeded"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(only_file_in(&out)).unwrap()).unwrap();
    let entries = saved.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["topic"], "Backpropagation");
    assert_eq!(entries[1]["quiz"]["questions"].as_array().unwrap().len(), 10);
}

#[test]
fn batch_reports_failed_requests() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "topics.toml",
        "[[requests]]\ntopic = \"\"\n\n[[requests]]\ntopic = \"Graphs\"\n",
    );

    groundquiz(dir.path())
        .args(["--offline", "batch", "--topics", "topics.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 2 requests failed"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    groundquiz(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created groundquiz.toml"))
        .stdout(predicate::str::contains("Created batches/example.toml"));

    assert!(dir.path().join("groundquiz.toml").exists());

    // Second run leaves existing files alone.
    groundquiz(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));
}

#[test]
fn list_models_from_config() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "custom.toml",
        r#"
default_provider = "groq"

[providers.groq]
type = "groq"
api_key = "gsk-test"

[providers.demo]
type = "mock"
response = "50"
"#,
    );

    groundquiz(dir.path())
        .args(["--config", "custom.toml", "list-models"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: groq (default)"))
        .stdout(predicate::str::contains("llama-3.1-8b-instant"))
        .stdout(predicate::str::contains("Provider: demo"));
}

#[tokio::test(flavor = "multi_thread")]
async fn list_models_queries_ollama_tags() {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{"name": "llama3.1:8b"}, {"name": "mistral:7b"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "groundquiz.toml",
        &format!(
            "default_provider = \"local\"\n\n[providers.local]\ntype = \"ollama\"\nbase_url = \"{}\"\n",
            server.uri()
        ),
    );

    let root = dir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || {
        groundquiz(&root).arg("list-models").output().unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("Provider: local (default)"));
    assert!(stdout.contains("llama3.1:8b"));
    assert!(stdout.contains("mistral:7b"));
    assert!(!stdout.contains("discovered at runtime"));
}

#[test]
fn list_models_reports_unreachable_ollama() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "groundquiz.toml",
        "[providers.local]\ntype = \"ollama\"\nbase_url = \"http://127.0.0.1:1\"\n",
    );

    groundquiz(dir.path())
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: local"))
        .stdout(predicate::str::contains("unavailable"));
}

#[test]
fn list_models_without_providers() {
    let dir = TempDir::new().unwrap();

    groundquiz(dir.path())
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("No providers configured"));
}

#[test]
fn missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();

    groundquiz(dir.path())
        .args(["--config", "nope.toml", "list-models"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}
