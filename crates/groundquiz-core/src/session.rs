//! A record of one learner's pass through the tutoring loop.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Difficulty, QuizOrigin, RelevanceScore};
use crate::tutor::{AttemptVerdict, Grade};

/// One graded quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt_number: u32,
    pub difficulty: Difficulty,
    pub origin: QuizOrigin,
    pub relevance: RelevanceScore,
    pub grade: Grade,
    pub verdict: AttemptVerdict,
    pub recorded_at: DateTime<Utc>,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    InProgress,
    Mastered,
    Exhausted,
}

/// All attempts for one topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub topic: String,
    pub started_at: DateTime<Utc>,
    pub attempts: Vec<AttemptRecord>,
    pub outcome: SessionOutcome,
}

impl SessionRecord {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            started_at: Utc::now(),
            attempts: Vec::new(),
            outcome: SessionOutcome::InProgress,
        }
    }

    /// Append an attempt; the verdict settles the outcome when final.
    pub fn record(&mut self, attempt: AttemptRecord) {
        self.outcome = match attempt.verdict {
            AttemptVerdict::Mastered => SessionOutcome::Mastered,
            AttemptVerdict::Exhausted => SessionOutcome::Exhausted,
            AttemptVerdict::Retry { .. } => SessionOutcome::InProgress,
        };
        self.attempts.push(attempt);
    }

    /// Best percentage across attempts, if any.
    pub fn best_percent(&self) -> Option<u8> {
        self.attempts.iter().map(|a| a.grade.percent).max()
    }

    /// Save the record as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize session")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write session to {}", path.display()))?;
        Ok(())
    }

    /// Load a record from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read session from {}", path.display()))?;
        let record: SessionRecord =
            serde_json::from_str(&content).context("failed to parse session JSON")?;
        Ok(record)
    }
}
