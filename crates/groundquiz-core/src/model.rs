//! Core data model types for groundquiz.
//!
//! A [`Question`] or [`Quiz`] can only be built through its validating
//! constructor (or deserialized through the same checks), so code holding one
//! never needs to re-check its shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// Number of questions in every quiz.
pub const QUIZ_LENGTH: usize = 10;

/// Number of options per question.
pub const OPTION_COUNT: usize = 4;

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct Question {
    question: String,
    options: [String; OPTION_COUNT],
    correct_index: u8,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    explanation: String,
}

/// Unchecked wire shape, only used to funnel deserialization through
/// [`Question::new`].
#[derive(Deserialize)]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    #[serde(alias = "answer_index")]
    correct_index: i64,
    #[serde(default)]
    explanation: String,
}

impl TryFrom<RawQuestion> for Question {
    type Error = QuizError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let index = u8::try_from(raw.correct_index).map_err(|_| {
            QuizError::contract(format!(
                "correct_index {} out of range 0..={}",
                raw.correct_index,
                OPTION_COUNT - 1
            ))
        })?;
        Question::new(raw.question, raw.options, index)
            .map(|q| q.with_explanation(raw.explanation))
    }
}

impl Question {
    /// Build a question, enforcing non-empty text, exactly four options and
    /// an in-range correct index. Text and options are trimmed.
    pub fn new(
        question: impl Into<String>,
        options: Vec<String>,
        correct_index: u8,
    ) -> Result<Self, QuizError> {
        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(QuizError::contract("question text is empty"));
        }
        let found = options.len();
        let options: [String; OPTION_COUNT] = options
            .into_iter()
            .map(|o| o.trim().to_string())
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|_| {
                QuizError::contract(format!("expected {OPTION_COUNT} options, found {found}"))
            })?;
        if usize::from(correct_index) >= OPTION_COUNT {
            return Err(QuizError::contract(format!(
                "correct_index {correct_index} out of range 0..={}",
                OPTION_COUNT - 1
            )));
        }
        Ok(Self {
            question,
            options,
            correct_index,
            explanation: String::new(),
        })
    }

    /// Attach a rationale for the correct answer.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into().trim().to_string();
        self
    }

    pub fn text(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_index(&self) -> u8 {
        self.correct_index
    }

    /// Rationale for the correct answer; empty when none was supplied.
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Whether `answer` picks the correct option.
    pub fn is_correct(&self, answer: u8) -> bool {
        answer == self.correct_index
    }
}

/// Which path produced a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizOrigin {
    /// Generated by the oracle and fully validated.
    Oracle,
    /// Deterministic synthetic placeholder.
    Fallback,
}

impl fmt::Display for QuizOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizOrigin::Oracle => write!(f, "oracle"),
            QuizOrigin::Fallback => write!(f, "fallback"),
        }
    }
}

/// An immutable quiz of exactly [`QUIZ_LENGTH`] questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuiz")]
pub struct Quiz {
    questions: Vec<Question>,
    origin: QuizOrigin,
}

#[derive(Deserialize)]
struct RawQuiz {
    questions: Vec<Question>,
    origin: QuizOrigin,
}

impl TryFrom<RawQuiz> for Quiz {
    type Error = QuizError;

    fn try_from(raw: RawQuiz) -> Result<Self, Self::Error> {
        Quiz::new(raw.questions, raw.origin)
    }
}

impl Quiz {
    /// Build a quiz; anything other than exactly [`QUIZ_LENGTH`] questions is
    /// rejected.
    pub fn new(questions: Vec<Question>, origin: QuizOrigin) -> Result<Self, QuizError> {
        if questions.len() != QUIZ_LENGTH {
            return Err(QuizError::contract(format!(
                "a quiz needs exactly {QUIZ_LENGTH} questions, got {}",
                questions.len()
            )));
        }
        Ok(Self { questions, origin })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn origin(&self) -> QuizOrigin {
        self.origin
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == QuizOrigin::Fallback
    }

    /// Correct option index of every question, in order.
    pub fn answer_key(&self) -> Vec<u8> {
        self.questions.iter().map(Question::correct_index).collect()
    }

    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

/// Estimated percentage (0..=100) of quiz questions answerable from the
/// source explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelevanceScore(u8);

impl RelevanceScore {
    pub const ZERO: RelevanceScore = RelevanceScore(0);
    /// Returned when there is nothing to compare against.
    pub const NEUTRAL: RelevanceScore = RelevanceScore(50);

    /// Clamp any integer into the valid range.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RelevanceScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Wording difficulty requested from the oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Normal,
    Easy,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Normal => write!(f, "normal"),
            Difficulty::Easy => write!(f, "easy"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "medium" => Ok(Difficulty::Normal),
            "easy" | "simple" => Ok(Difficulty::Easy),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}
