//! Streaming-related error types.
//!
//! Errors raised while decoding and classifying the SSE stream, plus the
//! stall timeout that hands the turn over to the fallback request.

use std::fmt;

use crate::sse::SseParseError;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// A data frame was not valid JSON.
    InvalidJson {
        data: String,
        message: String,
    },

    /// A data frame was JSON but not an event envelope.
    UnexpectedShape {
        data: String,
    },

    /// Reading the response body failed mid-stream.
    ReadFailed {
        message: String,
    },

    /// No meaningful content arrived before a deadline expired.
    Stalled {
        deadline_ms: u64,
    },
}

impl StreamError {
    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::InvalidJson { .. } => "E_STREAM_JSON",
            StreamError::UnexpectedShape { .. } => "E_STREAM_SHAPE",
            StreamError::ReadFailed { .. } => "E_STREAM_READ",
            StreamError::Stalled { .. } => "E_STREAM_STALL",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::InvalidJson { data, message } => {
                write!(f, "Invalid JSON in frame '{}': {}", data, message)
            }
            StreamError::UnexpectedShape { data } => {
                write!(f, "Frame is not an event envelope: {}", data)
            }
            StreamError::ReadFailed { message } => write!(f, "Stream read failed: {}", message),
            StreamError::Stalled { deadline_ms } => {
                write!(f, "Stream stalled past {} ms deadline", deadline_ms)
            }
        }
    }
}

impl std::error::Error for StreamError {}

impl From<SseParseError> for StreamError {
    fn from(err: SseParseError) -> Self {
        match err {
            SseParseError::InvalidJson { data, source } => StreamError::InvalidJson {
                data,
                message: source,
            },
            SseParseError::NotAnEnvelope { data } => StreamError::UnexpectedShape { data },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_convert() {
        let err: StreamError = SseParseError::InvalidJson {
            data: "{oops".to_string(),
            source: "EOF".to_string(),
        }
        .into();
        assert_eq!(err.error_code(), "E_STREAM_JSON");

        let err: StreamError = SseParseError::NotAnEnvelope {
            data: "42".to_string(),
        }
        .into();
        assert_eq!(err, StreamError::UnexpectedShape { data: "42".to_string() });
    }

    #[test]
    fn test_stall_display() {
        let err = StreamError::Stalled { deadline_ms: 5000 };
        assert_eq!(err.error_code(), "E_STREAM_STALL");
        assert_eq!(err.to_string(), "Stream stalled past 5000 ms deadline");
    }
}
