//! Turn model: one question/answer exchange.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FailureKind;

/// Unique identifier of a turn, generated at submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(String);

impl TurnId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TurnId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Pending,
    Streaming,
    Finalized,
    Failed,
}

impl TurnStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStatus::Finalized | TurnStatus::Failed)
    }
}

/// Which path produced the final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    Stream,
    Fallback,
}

/// Snapshot of a turn as seen by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub question: String,
    pub answer: String,
    pub status: TurnStatus,
    pub source: Option<AnswerSource>,
    pub failure: Option<FailureKind>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            question: question.into(),
            answer: String::new(),
            status: TurnStatus::Pending,
            source: None,
            failure: None,
            created_at: Utc::now(),
        }
    }

    /// Text to render: the answer, or the generic message once failed.
    pub fn display_text(&self) -> &str {
        match self.failure {
            Some(kind) if self.status == TurnStatus::Failed => kind.user_message(),
            _ => &self.answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE_MESSAGE;

    #[test]
    fn test_turn_ids_are_unique() {
        let a = TurnId::new();
        let b = TurnId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_new_turn_is_pending() {
        let turn = Turn::new("hi");
        assert_eq!(turn.status, TurnStatus::Pending);
        assert!(turn.answer.is_empty());
        assert!(!turn.status.is_terminal());
    }

    #[test]
    fn test_failed_turn_displays_generic_message() {
        let mut turn = Turn::new("hi");
        turn.status = TurnStatus::Failed;
        turn.failure = Some(FailureKind::EmptyResult);
        assert_eq!(turn.display_text(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&TurnStatus::Finalized).unwrap(),
            "\"finalized\""
        );
    }
}
