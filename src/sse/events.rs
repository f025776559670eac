//! Classified stream events.
//!
//! Every data frame from the agent-flow stream maps to exactly one
//! `StreamEvent`. Frames that cannot be parsed surface as `SseParseError`
//! and are dropped by the consumer.

use std::fmt;

/// Semantic event produced by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental answer text. May be empty.
    Token(String),
    /// An internal agent sub-step started. Carries the node label.
    StageStarted(String),
    /// An internal agent sub-step finished. Carries the node label.
    StageEnded(String),
    /// Answer text delivered through the agent-response channel.
    AgentText(String),
    /// Answer text delivered through the final-response channel.
    FinalText(String),
    /// Explicit terminal marker. Any payload is ignored.
    End,
    /// Anything else; causes no state change.
    Unknown,
}

impl StreamEvent {
    /// Text this event contributes to the answer, if any.
    pub fn answer_text(&self) -> Option<&str> {
        match self {
            StreamEvent::Token(text)
            | StreamEvent::AgentText(text)
            | StreamEvent::FinalText(text) => Some(text),
            _ => None,
        }
    }

    /// Short name used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Token(_) => "token",
            StreamEvent::StageStarted(_) => "stage_started",
            StreamEvent::StageEnded(_) => "stage_ended",
            StreamEvent::AgentText(_) => "agent_text",
            StreamEvent::FinalText(_) => "final_text",
            StreamEvent::End => "end",
            StreamEvent::Unknown => "unknown",
        }
    }
}

/// Errors produced while classifying a data frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// The data string is not valid JSON.
    InvalidJson { data: String, source: String },
    /// The data string is JSON but not an object envelope.
    NotAnEnvelope { data: String },
}

impl fmt::Display for SseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SseParseError::InvalidJson { data, source } => {
                write!(f, "Invalid JSON in SSE data '{}': {}", data, source)
            }
            SseParseError::NotAnEnvelope { data } => {
                write!(f, "SSE data is not an event envelope: {}", data)
            }
        }
    }
}

impl std::error::Error for SseParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_text_channels() {
        assert_eq!(StreamEvent::Token("a".into()).answer_text(), Some("a"));
        assert_eq!(StreamEvent::AgentText("b".into()).answer_text(), Some("b"));
        assert_eq!(StreamEvent::FinalText("c".into()).answer_text(), Some("c"));
        assert_eq!(StreamEvent::StageStarted("x".into()).answer_text(), None);
        assert_eq!(StreamEvent::End.answer_text(), None);
        assert_eq!(StreamEvent::Unknown.answer_text(), None);
    }

    #[test]
    fn test_parse_error_display() {
        let err = SseParseError::InvalidJson {
            data: "nope".to_string(),
            source: "expected value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid JSON in SSE data 'nope': expected value"
        );
    }
}
