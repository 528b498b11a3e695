//! Relevance scoring: how much of a quiz is answerable from its source text.
//!
//! The oracle is asked first when one is configured; any failure falls
//! through to [`lexical_score`], a bag-of-words overlap heuristic.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::error::OracleFailure;
use crate::extract::first_integer;
use crate::model::{Question, RelevanceScore, QUIZ_LENGTH};
use crate::traits::{ask_oracle, GenerateRequest, LlmProvider, DEFAULT_SYSTEM_PROMPT};

/// Additive calibration applied to the mean token overlap. Paraphrased but
/// valid questions share fewer literal tokens with the source prose.
pub const LEXICAL_OFFSET: f64 = 0.35;

/// Tokens must be longer than this to count as significant.
const MIN_TOKEN_LEN: usize = 3;

/// Settings for relevance scoring.
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub model: String,
    pub max_tokens: u32,
    pub oracle_timeout: Duration,
    pub lexical_offset: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 16,
            oracle_timeout: Duration::from_secs(60),
            lexical_offset: LEXICAL_OFFSET,
        }
    }
}

/// Scores quiz/source grounding.
#[derive(Clone)]
pub struct RelevanceScorer {
    oracle: Option<Arc<dyn LlmProvider>>,
    config: ScorerConfig,
}

impl RelevanceScorer {
    pub fn new(oracle: Option<Arc<dyn LlmProvider>>, config: ScorerConfig) -> Self {
        Self { oracle, config }
    }

    pub fn offline(config: ScorerConfig) -> Self {
        Self::new(None, config)
    }

    /// Score `questions` against `source_text`. Always within 0..=100.
    pub async fn score(&self, source_text: &str, questions: &[Question]) -> RelevanceScore {
        if source_text.is_empty() || questions.is_empty() {
            return RelevanceScore::ZERO;
        }

        match self.oracle_score(source_text, questions).await {
            Ok(score) => score,
            Err(OracleFailure::Unavailable) => {
                lexical_score(source_text, questions, self.config.lexical_offset)
            }
            Err(reason) => {
                tracing::warn!(reason = %reason, "oracle relevance scoring failed, using lexical overlap");
                lexical_score(source_text, questions, self.config.lexical_offset)
            }
        }
    }

    async fn oracle_score(
        &self,
        source_text: &str,
        questions: &[Question],
    ) -> Result<RelevanceScore, OracleFailure> {
        let oracle = self.oracle.as_deref().ok_or(OracleFailure::Unavailable)?;
        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: build_relevance_prompt(source_text, questions),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
        };
        let answer = ask_oracle(oracle, &request, self.config.oracle_timeout)
            .await
            .into_result()?;
        first_integer(&answer)
            .map(RelevanceScore::clamped)
            .ok_or_else(|| OracleFailure::Malformed(format!("no integer in {answer:?}")))
    }
}

/// Prompt asking for a single integer percentage.
pub fn build_relevance_prompt(source_text: &str, questions: &[Question]) -> String {
    let formatted = questions
        .iter()
        .take(QUIZ_LENGTH)
        .enumerate()
        .map(|(i, q)| format!("Q{}: {}\nOptions: {}", i + 1, q.text(), q.options().join(" | ")))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"Evaluate how well these MCQs are grounded ONLY in the provided explanation.
Return one integer 0-100 representing the percentage of questions that can be
answered directly from the explanation text.

Explanation:
<BEGIN_EXPLANATION>
{source_text}
<END_EXPLANATION>

MCQs:
{formatted}

Return only the integer percentage (no words).
"#
    )
}

/// Lowercase ASCII-alphanumeric words longer than three characters.
pub fn significant_tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| w.len() > MIN_TOKEN_LEN)
        .map(str::to_ascii_lowercase)
        .collect()
}

/// Bag-of-words grounding estimate.
///
/// Each question (text plus options) contributes the fraction of its tokens
/// found in the source; questions without tokens are skipped. The mean is
/// shifted by `offset`, scaled to a percentage, rounded and clamped.
/// An empty source or question list scores 0; a non-empty source without
/// significant tokens (whitespace, short words) is neutral, as is a quiz
/// whose questions carry no tokens.
pub fn lexical_score(source_text: &str, questions: &[Question], offset: f64) -> RelevanceScore {
    if source_text.is_empty() || questions.is_empty() {
        return RelevanceScore::ZERO;
    }
    let source_tokens = significant_tokens(source_text);
    if source_tokens.is_empty() {
        return RelevanceScore::NEUTRAL;
    }

    let overlaps: Vec<f64> = questions
        .iter()
        .filter_map(|q| {
            let mut text = q.text().to_string();
            for option in q.options() {
                text.push(' ');
                text.push_str(option);
            }
            let tokens = significant_tokens(&text);
            if tokens.is_empty() {
                return None;
            }
            let shared = tokens.intersection(&source_tokens).count();
            Some(shared as f64 / tokens.len() as f64)
        })
        .collect();

    if overlaps.is_empty() {
        return RelevanceScore::NEUTRAL;
    }
    let mean = overlaps.iter().sum::<f64>() / overlaps.len() as f64;
    RelevanceScore::clamped(((offset + mean) * 100.0).round() as i64)
}
