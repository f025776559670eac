//! Unified error type for chat turns.
//!
//! `ChatError` wraps the domain errors so the supervisor can log them with a
//! single code and decide, from the category, whether anything reaches the
//! presentation layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::category::ErrorCategory;
use super::config::ConfigError;
use super::network::NetworkError;
use super::stream::StreamError;

/// Message shown to the user whenever a turn fails.
pub const GENERIC_FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Unified error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatError {
    /// Transport failures (primary or fallback endpoint).
    Network(NetworkError),

    /// SSE decoding, classification or stall errors.
    Stream(StreamError),

    /// Missing or invalid configuration.
    Config(ConfigError),

    /// Neither the stream nor the fallback produced usable text.
    EmptyResult,
}

impl ChatError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Network(NetworkError::InvalidUrl { .. }) => ErrorCategory::Configuration,
            ChatError::Network(_) => ErrorCategory::Network,
            ChatError::Stream(StreamError::Stalled { .. }) => ErrorCategory::Timeout,
            ChatError::Stream(StreamError::ReadFailed { .. }) => ErrorCategory::Network,
            ChatError::Stream(_) => ErrorCategory::Protocol,
            ChatError::Config(_) => ErrorCategory::Configuration,
            ChatError::EmptyResult => ErrorCategory::EmptyResult,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Network(err) => err.error_code(),
            ChatError::Stream(err) => err.error_code(),
            ChatError::Config(err) => err.error_code(),
            ChatError::EmptyResult => "E_EMPTY_RESULT",
        }
    }

    /// The failure kind reported through `on_failed`, if this error is one
    /// the user gets to see.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        let category = self.category();
        if !category.is_user_visible() {
            return None;
        }
        match category {
            ErrorCategory::Configuration => Some(FailureKind::Configuration),
            _ => Some(FailureKind::EmptyResult),
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Network(err) => write!(f, "{}", err),
            ChatError::Stream(err) => write!(f, "{}", err),
            ChatError::Config(err) => write!(f, "{}", err),
            ChatError::EmptyResult => write!(f, "No usable answer from stream or fallback"),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::Network(err) => Some(err),
            ChatError::Stream(err) => Some(err),
            ChatError::Config(err) => Some(err),
            ChatError::EmptyResult => None,
        }
    }
}

impl From<NetworkError> for ChatError {
    fn from(err: NetworkError) -> Self {
        ChatError::Network(err)
    }
}

impl From<StreamError> for ChatError {
    fn from(err: StreamError) -> Self {
        ChatError::Stream(err)
    }
}

impl From<ConfigError> for ChatError {
    fn from(err: ConfigError) -> Self {
        ChatError::Config(err)
    }
}

/// Why a turn ended in the failed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Both primary and fallback produced nothing.
    EmptyResult,
    /// Endpoint configuration is missing or invalid.
    Configuration,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::EmptyResult => "empty_result",
            FailureKind::Configuration => "configuration",
        }
    }

    /// Text to render in place of the answer.
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
