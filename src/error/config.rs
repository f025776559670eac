//! Configuration error types.

use std::fmt;

/// Missing or malformed configuration values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required environment variable is not set.
    Missing { key: &'static str },

    /// An environment variable is set but cannot be parsed.
    InvalidValue {
        key: &'static str,
        value: String,
        message: String,
    },
}

impl ConfigError {
    /// Name of the offending setting.
    pub fn key(&self) -> &'static str {
        match self {
            ConfigError::Missing { key } | ConfigError::InvalidValue { key, .. } => key,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Missing { .. } => "E_CFG_MISSING",
            ConfigError::InvalidValue { .. } => "E_CFG_INVALID",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { key } => write!(f, "{} is not set in the environment.", key),
            ConfigError::InvalidValue {
                key,
                value,
                message,
            } => write!(f, "Invalid value '{}' for {}: {}", value, key, message),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_message_matches_proxy_body() {
        let err = ConfigError::Missing { key: "FLOWISE_URL" };
        assert_eq!(err.to_string(), "FLOWISE_URL is not set in the environment.");
        assert_eq!(err.key(), "FLOWISE_URL");
    }

    #[test]
    fn test_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            key: "FLOWCHAT_GLOBAL_DEADLINE_MS",
            value: "soon".to_string(),
            message: "invalid digit found in string".to_string(),
        };
        assert!(err.to_string().contains("FLOWCHAT_GLOBAL_DEADLINE_MS"));
        assert_eq!(err.error_code(), "E_CFG_INVALID");
    }
}
