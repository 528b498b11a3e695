//! groundquiz-core — Grounded quiz generation and relevance scoring.
//!
//! This crate defines the quiz data model, the oracle trait, and the
//! generate/validate/fallback/score pipeline that the rest of groundquiz
//! builds on.

pub mod batch;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod generator;
pub mod grounder;
pub mod model;
pub mod relevance;
pub mod session;
pub mod traits;
pub mod tutor;

#[cfg(test)]
mod testing;

pub use error::{OracleFailure, QuizError};
pub use grounder::{GeneratedQuiz, GrounderConfig, QuizGrounder};
pub use model::{Difficulty, Question, Quiz, QuizOrigin, RelevanceScore};
