//! Error types for the quiz pipeline.
//!
//! Only [`QuizError`] ever reaches a caller. [`OracleFailure`] describes why an
//! oracle-backed path was abandoned; it is logged and then recovered locally
//! by the fallback quiz or the lexical scorer.

use std::time::Duration;

use thiserror::Error;

/// Errors surfaced to callers of the quiz pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuizError {
    /// The caller passed input that breaks the API contract (empty topic,
    /// wrong answer count, out-of-range option index, ...).
    #[error("contract violation: {0}")]
    ContractViolation(String),
}

impl QuizError {
    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        QuizError::ContractViolation(msg.into())
    }
}

/// Why an oracle-backed step could not be used.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OracleFailure {
    /// No oracle is configured.
    #[error("no oracle configured")]
    Unavailable,

    /// The oracle did not answer within the configured timeout.
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    /// The oracle call itself failed (network, auth, rate limit, ...).
    #[error("oracle request failed: {0}")]
    Request(String),

    /// The oracle answered, but the payload could not be used.
    #[error("malformed oracle output: {0}")]
    Malformed(String),

    /// The payload parsed but did not yield exactly the expected number of
    /// valid questions.
    #[error("expected {expected} valid questions, found {found}")]
    WrongCount { expected: usize, found: usize },
}
