//! Error category classification.
//!
//! Categories decide how far an error travels: everything except
//! configuration problems and empty results is absorbed by the supervisor.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network failure reaching the primary or fallback endpoint.
    /// Recovered by falling back (primary) or by failing the turn (fallback).
    Network,

    /// Malformed SSE frame or non-JSON payload.
    /// Recovered by dropping the offending frame.
    Protocol,

    /// No meaningful content within a deadline.
    /// Triggers the fallback request.
    Timeout,

    /// Missing or invalid endpoint configuration.
    /// Fatal, never retried.
    Configuration,

    /// Neither the stream nor the fallback produced usable text.
    EmptyResult,
}

impl ErrorCategory {
    /// Returns true if errors in this category reach the presentation layer.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, ErrorCategory::Configuration | ErrorCategory::EmptyResult)
    }

    /// Returns true if the fallback request is an acceptable recovery.
    pub fn triggers_fallback(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Timeout)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Protocol => "protocol",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::EmptyResult => "empty_result",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
