//! The caller-facing entry point: generate a quiz and score its grounding.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::fallback::BASIS_HINT_CHARS;
use crate::generator::{GeneratorConfig, QuizGenerator};
use crate::model::{Difficulty, Question, Quiz, RelevanceScore};
use crate::relevance::{RelevanceScorer, ScorerConfig, LEXICAL_OFFSET};
use crate::traits::LlmProvider;

/// Configuration for [`QuizGrounder`].
#[derive(Debug, Clone)]
pub struct GrounderConfig {
    /// Model identifier passed to the oracle.
    pub model: String,
    /// Sampling temperature for quiz generation.
    pub temperature: f64,
    /// Max tokens for quiz generation.
    pub max_tokens: u32,
    /// Upper bound on every oracle call.
    pub oracle_timeout: Duration,
    /// Calibration offset of the lexical relevance heuristic.
    pub lexical_offset: f64,
    /// Source characters quoted by the fallback quiz.
    pub basis_hint_chars: usize,
}

impl Default for GrounderConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            temperature: 0.3,
            max_tokens: 2048,
            oracle_timeout: Duration::from_secs(60),
            lexical_offset: LEXICAL_OFFSET,
            basis_hint_chars: BASIS_HINT_CHARS,
        }
    }
}

/// A quiz together with its grounding score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    pub quiz: Quiz,
    pub relevance: RelevanceScore,
}

/// Generates grounded quizzes and scores them.
///
/// Holds no per-request state; one instance can serve concurrent callers.
#[derive(Clone)]
pub struct QuizGrounder {
    generator: QuizGenerator,
    scorer: RelevanceScorer,
}

impl QuizGrounder {
    pub fn new(oracle: Option<Arc<dyn LlmProvider>>, config: GrounderConfig) -> Self {
        let generator = QuizGenerator::new(
            oracle.clone(),
            GeneratorConfig {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                oracle_timeout: config.oracle_timeout,
                basis_hint_chars: config.basis_hint_chars,
            },
        );
        let scorer = RelevanceScorer::new(
            oracle,
            ScorerConfig {
                model: config.model,
                oracle_timeout: config.oracle_timeout,
                lexical_offset: config.lexical_offset,
                ..ScorerConfig::default()
            },
        );
        Self { generator, scorer }
    }

    /// Grounder without an oracle: fallback quizzes, lexical scores.
    pub fn offline(config: GrounderConfig) -> Self {
        Self::new(None, config)
    }

    pub fn has_oracle(&self) -> bool {
        self.generator.has_oracle()
    }

    /// Generate a ten-question quiz from `source_text` and score it.
    pub async fn generate_quiz(
        &self,
        topic: &str,
        source_text: &str,
        difficulty: Difficulty,
    ) -> Result<GeneratedQuiz, QuizError> {
        let quiz = self.generator.generate(topic, source_text, difficulty).await?;
        let relevance = self.scorer.score(source_text, quiz.questions()).await;
        tracing::info!(
            topic = topic.trim(),
            origin = %quiz.origin(),
            relevance = relevance.value(),
            "quiz ready"
        );
        Ok(GeneratedQuiz { quiz, relevance })
    }

    /// Score arbitrary questions against `source_text`.
    pub async fn score_relevance(&self, source_text: &str, questions: &[Question]) -> RelevanceScore {
        self.scorer.score(source_text, questions).await
    }
}
