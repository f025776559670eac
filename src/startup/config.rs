//! Runtime configuration.
//!
//! `ChatConfig` drives the turn supervisor, `ProxyConfig` the HTTP proxy.
//! Both are read from the environment with `from_env()` and can be adjusted
//! with the `with_*` builder methods.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_PRIMARY_URL: &str = "FLOWCHAT_PRIMARY_URL";
pub const ENV_FALLBACK_URL: &str = "FLOWCHAT_FALLBACK_URL";
pub const ENV_GLOBAL_DEADLINE_MS: &str = "FLOWCHAT_GLOBAL_DEADLINE_MS";
pub const ENV_STAGE_DEADLINE_MS: &str = "FLOWCHAT_STAGE_DEADLINE_MS";
pub const ENV_PRIMARY_AGENT_LABEL: &str = "FLOWCHAT_PRIMARY_AGENT_LABEL";
pub const ENV_FLOWISE_URL: &str = "FLOWISE_URL";
pub const ENV_BIND: &str = "FLOWCHAT_BIND";

const DEFAULT_PRIMARY_URL: &str = "http://127.0.0.1:3000/api/chat";
const DEFAULT_FALLBACK_URL: &str = "http://127.0.0.1:3000/api/chat-fallback";
const DEFAULT_GLOBAL_DEADLINE_MS: u64 = 5000;
const DEFAULT_STAGE_DEADLINE_MS: u64 = 3000;
const DEFAULT_PRIMARY_AGENT_LABEL: &str = "Agent";
const DEFAULT_BIND: &str = "127.0.0.1:3000";

/// Configuration for chat turns.
///
/// # Example
///
/// ```ignore
/// use flowchat::startup::ChatConfig;
///
/// let config = ChatConfig::default()
///     .with_primary_url("http://localhost:3000/api/chat")
///     .with_stage_deadline(Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ChatConfig {
    /// Streaming endpoint
    pub primary_url: String,
    /// Non-streaming endpoint
    pub fallback_url: String,
    /// Deadline from stream start for the first content
    pub global_deadline: Duration,
    /// Deadline from the primary agent's stage start
    pub stage_deadline: Duration,
    /// Node label whose stage start arms the stage deadline
    pub primary_agent_label: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            global_deadline: Duration::from_millis(DEFAULT_GLOBAL_DEADLINE_MS),
            stage_deadline: Duration::from_millis(DEFAULT_STAGE_DEADLINE_MS),
            primary_agent_label: DEFAULT_PRIMARY_AGENT_LABEL.to_string(),
        }
    }
}

impl ChatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_primary_url(mut self, url: impl Into<String>) -> Self {
        self.primary_url = url.into();
        self
    }

    pub fn with_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.fallback_url = url.into();
        self
    }

    pub fn with_global_deadline(mut self, deadline: Duration) -> Self {
        self.global_deadline = deadline;
        self
    }

    pub fn with_stage_deadline(mut self, deadline: Duration) -> Self {
        self.stage_deadline = deadline;
        self
    }

    /// Set the primary agent label. Surrounding whitespace is ignored.
    pub fn with_primary_agent_label(mut self, label: impl Into<String>) -> Self {
        self.primary_agent_label = label.into().trim().to_string();
        self
    }

    /// Whether a stage label names the primary agent.
    pub fn is_primary_agent(&self, label: &str) -> bool {
        label.trim() == self.primary_agent_label
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_PRIMARY_URL) {
            config.primary_url = parse_url(ENV_PRIMARY_URL, &url)?;
        }
        if let Some(url) = lookup(ENV_FALLBACK_URL) {
            config.fallback_url = parse_url(ENV_FALLBACK_URL, &url)?;
        }
        if let Some(ms) = lookup(ENV_GLOBAL_DEADLINE_MS) {
            config.global_deadline = parse_millis(ENV_GLOBAL_DEADLINE_MS, &ms)?;
        }
        if let Some(ms) = lookup(ENV_STAGE_DEADLINE_MS) {
            config.stage_deadline = parse_millis(ENV_STAGE_DEADLINE_MS, &ms)?;
        }
        if let Some(label) = lookup(ENV_PRIMARY_AGENT_LABEL) {
            if label.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_PRIMARY_AGENT_LABEL,
                    value: label,
                    message: "label must not be blank".to_string(),
                });
            }
            config = config.with_primary_agent_label(label);
        }
        Ok(config)
    }
}

/// Configuration for the proxy server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    /// Upstream prediction URL. Checked per request, not at start-up.
    pub flowise_url: Option<String>,
    /// Listen address
    pub bind: SocketAddr,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            flowise_url: None,
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

impl ProxyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flowise_url(mut self, url: impl Into<String>) -> Self {
        self.flowise_url = Some(url.into());
        self
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    /// Upstream URL, or the configuration error to report for this request.
    pub fn require_flowise_url(&self) -> Result<&str, ConfigError> {
        self.flowise_url.as_deref().ok_or(ConfigError::Missing {
            key: ENV_FLOWISE_URL,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flowise_url = lookup(ENV_FLOWISE_URL).filter(|url| !url.trim().is_empty());
        let bind_value = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_value
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue {
                key: ENV_BIND,
                value: bind_value.clone(),
                message: e.to_string(),
            })?;
        Ok(Self { flowise_url, bind })
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            message: "expected an http(s) URL".to_string(),
        })
    }
}

fn parse_millis(key: &'static str, value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        Ok(_) => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            message: "deadline must be positive".to_string(),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            message: e.to_string(),
        }),
    }
}
