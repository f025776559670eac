//! Configuration read from the real process environment.

use std::time::Duration;

use flowchat::error::ConfigError;
use flowchat::startup::config::{
    ENV_BIND, ENV_FLOWISE_URL, ENV_GLOBAL_DEADLINE_MS, ENV_PRIMARY_AGENT_LABEL, ENV_PRIMARY_URL,
    ENV_STAGE_DEADLINE_MS,
};
use flowchat::startup::{ChatConfig, ProxyConfig};
use serial_test::serial;

const ALL_KEYS: [&str; 6] = [
    ENV_PRIMARY_URL,
    ENV_GLOBAL_DEADLINE_MS,
    ENV_STAGE_DEADLINE_MS,
    ENV_PRIMARY_AGENT_LABEL,
    ENV_FLOWISE_URL,
    ENV_BIND,
];

fn clear_env() {
    for key in ALL_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_chat_config_from_env() {
    clear_env();
    std::env::set_var(ENV_PRIMARY_URL, "http://localhost:4000/api/chat");
    std::env::set_var(ENV_GLOBAL_DEADLINE_MS, "8000");
    std::env::set_var(ENV_PRIMARY_AGENT_LABEL, "Writer");

    let config = ChatConfig::from_env().unwrap();
    assert_eq!(config.primary_url, "http://localhost:4000/api/chat");
    assert_eq!(config.global_deadline, Duration::from_millis(8000));
    assert_eq!(config.stage_deadline, Duration::from_millis(3000));
    assert!(config.is_primary_agent("Writer"));

    clear_env();
}

#[test]
#[serial]
fn test_chat_config_rejects_bad_env_value() {
    clear_env();
    std::env::set_var(ENV_STAGE_DEADLINE_MS, "-1");

    let err = ChatConfig::from_env().unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidValue {
            key: ENV_STAGE_DEADLINE_MS,
            ..
        }
    ));

    clear_env();
}

#[test]
#[serial]
fn test_proxy_config_from_env() {
    clear_env();
    let config = ProxyConfig::from_env().unwrap();
    assert!(config.flowise_url.is_none());

    std::env::set_var(ENV_FLOWISE_URL, "https://flowise.example/api/v1/prediction/abc");
    std::env::set_var(ENV_BIND, "127.0.0.1:4100");
    let config = ProxyConfig::from_env().unwrap();
    assert_eq!(
        config.flowise_url.as_deref(),
        Some("https://flowise.example/api/v1/prediction/abc")
    );
    assert_eq!(config.bind.port(), 4100);

    clear_env();
}
