//! Oracle-backed quiz generation with wholesale fallback.
//!
//! The generator either returns ten oracle questions that all passed
//! validation, or the synthetic fallback quiz. It never mixes the two.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::{OracleFailure, QuizError};
use crate::extract::{extract_json, extract_json_where};
use crate::fallback::{fallback_quiz_with_hint, BASIS_HINT_CHARS};
use crate::model::{Difficulty, Question, Quiz, QuizOrigin, OPTION_COUNT, QUIZ_LENGTH};
use crate::traits::{ask_oracle, GenerateRequest, LlmProvider, DEFAULT_SYSTEM_PROMPT};

/// Keys under which oracles commonly nest the question list.
const LIST_KEYS: [&str; 3] = ["mcqs", "questions", "quiz"];

/// Settings shared by every oracle call the generator makes.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Model identifier passed to the oracle.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Max tokens for generation.
    pub max_tokens: u32,
    /// Upper bound on a single oracle call.
    pub oracle_timeout: Duration,
    /// Source characters quoted by the fallback quiz.
    pub basis_hint_chars: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.3,
            max_tokens: 2048,
            oracle_timeout: Duration::from_secs(60),
            basis_hint_chars: BASIS_HINT_CHARS,
        }
    }
}

/// Generates quizzes grounded in a source explanation.
#[derive(Clone)]
pub struct QuizGenerator {
    oracle: Option<Arc<dyn LlmProvider>>,
    config: GeneratorConfig,
}

impl QuizGenerator {
    pub fn new(oracle: Option<Arc<dyn LlmProvider>>, config: GeneratorConfig) -> Self {
        Self { oracle, config }
    }

    /// Generator with no oracle; always produces the fallback quiz.
    pub fn offline(config: GeneratorConfig) -> Self {
        Self::new(None, config)
    }

    pub fn has_oracle(&self) -> bool {
        self.oracle.is_some()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a ten-question quiz for `topic` derived only from `source_text`.
    ///
    /// Only an empty topic is an error. Every oracle problem is logged and
    /// answered with the fallback quiz.
    pub async fn generate(
        &self,
        topic: &str,
        source_text: &str,
        difficulty: Difficulty,
    ) -> Result<Quiz, QuizError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(QuizError::contract("topic must not be empty"));
        }

        match self.try_oracle(topic, source_text, difficulty).await {
            Ok(quiz) => Ok(quiz),
            Err(reason) => {
                match &reason {
                    OracleFailure::Unavailable => {
                        tracing::info!(topic, "no oracle or no source text, using fallback quiz")
                    }
                    other => {
                        tracing::warn!(topic, reason = %other, "quiz generation failed, using fallback quiz")
                    }
                }
                Ok(self.fallback(topic, source_text))
            }
        }
    }

    /// The synthetic quiz this generator falls back to.
    pub fn fallback(&self, topic: &str, source_text: &str) -> Quiz {
        fallback_quiz_with_hint(topic, source_text, self.config.basis_hint_chars)
    }

    async fn try_oracle(
        &self,
        topic: &str,
        source_text: &str,
        difficulty: Difficulty,
    ) -> Result<Quiz, OracleFailure> {
        let source = source_text.trim();
        // Without grounding material the "only from the source" rule cannot hold.
        let (Some(oracle), false) = (self.oracle.as_deref(), source.is_empty()) else {
            return Err(OracleFailure::Unavailable);
        };

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_quiz_prompt(topic, source, difficulty),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let raw = ask_oracle(oracle, &request, self.config.oracle_timeout)
            .await
            .into_result()?;
        parse_quiz(&raw)
    }
}

/// Prompt asking for exactly ten grounded MCQs as strict JSON.
pub fn build_quiz_prompt(topic: &str, source_text: &str, difficulty: Difficulty) -> String {
    let difficulty_line = match difficulty {
        Difficulty::Normal => "Keep questions medium difficulty (B.Tech level).",
        Difficulty::Easy => "Keep questions EASY and direct (based only on the explanation).",
    };
    format!(
        r#"You MUST generate MCQs ONLY from the explanation text provided below. Do NOT use outside facts.

Topic: "{topic}"

Explanation text (the ONLY source):
<BEGIN_EXPLANATION>
{source_text}
<END_EXPLANATION>

Task: Generate EXACTLY {QUIZ_LENGTH} multiple-choice questions (MCQs) derived ONLY from the explanation text.

Rules:
- Exactly {QUIZ_LENGTH} questions.
- Each question MUST have exactly {OPTION_COUNT} options.
- Only ONE option is correct.
- {difficulty_line}
- Avoid ambiguous wording.
- Do not ask anything that is not explicitly stated or clearly implied in the explanation text.
- Keep terminology consistent with the explanation to maximize relevance/traceability.

Return STRICT JSON ONLY (no markdown, no extra text) in this schema:
{{
  "mcqs": [
    {{
      "question": "string",
      "options": ["string", "string", "string", "string"],
      "correct_index": 0,
      "explanation": "string"
    }}
  ]
}}
"#
    )
}

/// Parse and validate an oracle answer into an oracle-origin quiz.
///
/// Invalid entries are dropped one by one; the batch is rejected as a whole
/// unless exactly [`QUIZ_LENGTH`] survive. Parseable spans that hold no
/// question objects (citations like `[1]`, stray `{}`) are skipped.
pub fn parse_quiz(raw: &str) -> Result<Quiz, OracleFailure> {
    let payload = extract_json_where(raw, holds_question_objects)
        .or_else(|| extract_json(raw))
        .ok_or_else(|| OracleFailure::Malformed("no JSON payload found".into()))?;
    let entries = question_list(&payload)
        .ok_or_else(|| OracleFailure::Malformed("payload holds no question list".into()))?;

    let total = entries.len();
    let kept: Vec<Question> = entries.iter().filter_map(validate_entry).collect();
    tracing::debug!(total, kept = kept.len(), "validated oracle entries");

    if kept.len() != QUIZ_LENGTH {
        return Err(OracleFailure::WrongCount {
            expected: QUIZ_LENGTH,
            found: kept.len(),
        });
    }
    Quiz::new(kept, QuizOrigin::Oracle).map_err(|e| OracleFailure::Malformed(e.to_string()))
}

fn holds_question_objects(payload: &Value) -> bool {
    question_list(payload).is_some_and(|entries| entries.iter().any(Value::is_object))
}

fn question_list(payload: &Value) -> Option<&Vec<Value>> {
    match payload {
        Value::Array(entries) => Some(entries),
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

/// Coerce a JSON scalar to text the way a loosely-typed oracle intends it.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_index(value: &Value) -> Option<u8> {
    let index = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u8::try_from(index).ok().filter(|i| usize::from(*i) < OPTION_COUNT)
}

/// Turn one raw entry into a [`Question`], or `None` to drop it.
///
/// Options are coerced with [`as_text`]: strings, numbers and booleans become
/// text, while a `null`, object or array option drops the whole entry.
fn validate_entry(entry: &Value) -> Option<Question> {
    let object = entry.as_object()?;
    let text = object.get("question").and_then(as_text)?;
    let options = object
        .get("options")?
        .as_array()?
        .iter()
        .map(as_text)
        .collect::<Option<Vec<_>>>()?;
    let index = object
        .get("correct_index")
        .or_else(|| object.get("answer_index"))
        .and_then(as_index)?;
    let explanation = object
        .get("explanation")
        .and_then(as_text)
        .unwrap_or_default();

    Question::new(text, options, index)
        .ok()
        .map(|q| q.with_explanation(explanation))
}
