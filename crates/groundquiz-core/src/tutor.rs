//! The teaching side of the loop: explanations, Feynman-style reteaching,
//! grading, and the mastery rule.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OracleFailure, QuizError};
use crate::model::{Difficulty, Quiz, OPTION_COUNT, QUIZ_LENGTH};
use crate::traits::{ask_oracle, GenerateRequest, LlmProvider, DEFAULT_SYSTEM_PROMPT};

/// Settings for explanation calls.
#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub oracle_timeout: Duration,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.3,
            max_tokens: 1024,
            oracle_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Style {
    Explain,
    Reteach,
}

/// Produces explanation text for topics, memoized per topic.
pub struct Tutor {
    oracle: Option<Arc<dyn LlmProvider>>,
    config: TutorConfig,
    memo: Mutex<HashMap<(Style, String), String>>,
}

impl Tutor {
    pub fn new(oracle: Option<Arc<dyn LlmProvider>>, config: TutorConfig) -> Self {
        Self {
            oracle,
            config,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn offline(config: TutorConfig) -> Self {
        Self::new(None, config)
    }

    /// Professional, engineering-level explanation of `topic`.
    pub async fn explain(&self, topic: &str) -> Result<String, QuizError> {
        self.teach(Style::Explain, topic, false).await
    }

    /// Simplified, Feynman-style re-explanation of `topic`.
    pub async fn reteach(&self, topic: &str) -> Result<String, QuizError> {
        self.teach(Style::Reteach, topic, false).await
    }

    /// Like [`Tutor::explain`], bypassing the memo.
    pub async fn explain_fresh(&self, topic: &str) -> Result<String, QuizError> {
        self.teach(Style::Explain, topic, true).await
    }

    async fn teach(&self, style: Style, topic: &str, force: bool) -> Result<String, QuizError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(QuizError::contract("topic must not be empty"));
        }
        let key = (style, topic.to_string());
        if !force {
            if let Some(text) = self.lock_memo().get(&key) {
                return Ok(text.clone());
            }
        }

        let text = match self.ask(style, topic).await {
            Ok(text) => text,
            Err(reason) => {
                if reason != OracleFailure::Unavailable {
                    tracing::warn!(topic, reason = %reason, "explanation failed, using fallback text");
                }
                match style {
                    Style::Explain => medium_fallback_explanation(topic),
                    Style::Reteach => simple_fallback_explanation(topic),
                }
            }
        };

        self.lock_memo().insert(key, text.clone());
        Ok(text)
    }

    fn lock_memo(&self) -> std::sync::MutexGuard<'_, HashMap<(Style, String), String>> {
        // A poisoned memo only means another caller panicked mid-insert.
        self.memo.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn ask(&self, style: Style, topic: &str) -> Result<String, OracleFailure> {
        let oracle = self.oracle.as_deref().ok_or(OracleFailure::Unavailable)?;
        let prompt = match style {
            Style::Explain => explain_prompt(topic),
            Style::Reteach => reteach_prompt(topic),
        };
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt,
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };
        ask_oracle(oracle, &request, self.config.oracle_timeout)
            .await
            .into_result()
    }
}

fn explain_prompt(topic: &str) -> String {
    format!(
        r#"You are a senior engineering instructor. Explain the topic: "{topic}".

Requirements (B.Tech level, production-ready clarity):
- Audience: engineering students.
- Tone: professional, precise, and concise.
- Structure with short sections: definition, core concepts, math/notation (if relevant),
  typical workflow/architecture, constraints/performance trade-offs, common pitfalls,
  and 2 practical engineering examples.
- Add 3-5 key takeaways as bullet points.
- Keep it focused (~200-350 words).
"#
    )
}

fn reteach_prompt(topic: &str) -> String {
    format!(
        r#"Re-teach the topic "{topic}" in a VERY SIMPLE way (Feynman style) without losing technical correctness.

Rules:
- Use short sentences and simple words.
- Start with a 1-2 line intuition.
- Then explain the core idea in 5-10 bullet points.
- Include 2 engineering/CS examples.
- End with 3 short self-check questions.
"#
    )
}

/// Offline stand-in for [`Tutor::explain`].
pub fn medium_fallback_explanation(topic: &str) -> String {
    format!(
        "## {topic} (Medium Explanation)\n\n\
         **Definition**\n\
         - {topic} is a concept/technology used in computer science and engineering.\n\n\
         **Core Ideas (what you should know)**\n\
         - What it is and what problem it solves\n\
         - Key components/terms (inputs, outputs, constraints)\n\
         - How it works at a high level (steps or pipeline)\n\n\
         **Engineering/CS Examples**\n\
         - Example 1: Where this appears in software systems (e.g., web apps, databases, networking)\n\
         - Example 2: How engineers use it in practice (e.g., performance, security, automation)\n\n\
         **Common Mistakes**\n\
         - Confusing definition with implementation details\n\
         - Ignoring constraints (time/space/accuracy/security)\n\n\
         **Quick Summary**\n\
         - If you can define {topic}, explain the main steps, and give 1 real example, you understand the basics.\n"
    )
}

/// Offline stand-in for [`Tutor::reteach`].
pub fn simple_fallback_explanation(topic: &str) -> String {
    format!(
        "## {topic} (Very Simple Explanation)\n\n\
         - {topic} is a technical idea used to solve a specific problem.\n\
         - Think: input -> processing -> output.\n\
         - If you can say what the input is, what happens in the middle, and what output you get, you understand it.\n"
    )
}

// ---------------------------------------------------------------------------
// Grading and mastery
// ---------------------------------------------------------------------------

/// Outcome of grading one set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub correct: usize,
    pub total: usize,
    pub percent: u8,
}

/// Grade `answers` (option indices) against `quiz`.
pub fn grade(quiz: &Quiz, answers: &[u8]) -> Result<Grade, QuizError> {
    if answers.len() != QUIZ_LENGTH {
        return Err(QuizError::contract(format!(
            "expected exactly {QUIZ_LENGTH} answers, got {}",
            answers.len()
        )));
    }
    if let Some(bad) = answers.iter().find(|&&a| usize::from(a) >= OPTION_COUNT) {
        return Err(QuizError::contract(format!(
            "answer index {bad} out of range 0..={}",
            OPTION_COUNT - 1
        )));
    }
    let correct = quiz
        .questions()
        .iter()
        .zip(answers)
        .filter(|(q, a)| q.is_correct(**a))
        .count();
    Ok(Grade {
        correct,
        total: QUIZ_LENGTH,
        percent: (correct * 100 / QUIZ_LENGTH) as u8,
    })
}

/// What happens after a graded attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum AttemptVerdict {
    /// Score met the threshold.
    Mastered,
    /// Below threshold; reteach and quiz again at `next_difficulty`.
    Retry {
        next_attempt: u32,
        next_difficulty: Difficulty,
    },
    /// Below threshold on the last allowed attempt.
    Exhausted,
}

/// The mastery rule: pass at `threshold_percent`, at most `max_attempts` tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryPolicy {
    pub threshold_percent: u8,
    pub max_attempts: u32,
}

impl Default for MasteryPolicy {
    fn default() -> Self {
        Self {
            threshold_percent: 70,
            max_attempts: 3,
        }
    }
}

impl MasteryPolicy {
    /// Difficulty used for a given (1-based) attempt. Retries are easier.
    pub fn difficulty_for(&self, attempt_number: u32) -> Difficulty {
        if attempt_number <= 1 {
            Difficulty::Normal
        } else {
            Difficulty::Easy
        }
    }

    /// Decide what follows attempt `attempt_number` (1-based) scoring `percent`.
    pub fn evaluate(&self, attempt_number: u32, percent: u8) -> Result<AttemptVerdict, QuizError> {
        if attempt_number == 0 || attempt_number > self.max_attempts {
            return Err(QuizError::contract(format!(
                "attempt {attempt_number} outside 1..={}",
                self.max_attempts
            )));
        }
        if percent >= self.threshold_percent {
            return Ok(AttemptVerdict::Mastered);
        }
        if attempt_number == self.max_attempts {
            return Ok(AttemptVerdict::Exhausted);
        }
        let next_attempt = attempt_number + 1;
        Ok(AttemptVerdict::Retry {
            next_attempt,
            next_difficulty: self.difficulty_for(next_attempt),
        })
    }
}
