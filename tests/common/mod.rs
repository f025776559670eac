//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use flowchat::adapters::ReqwestHttpClient;
use flowchat::proxy::{start_proxy_server_on, ProxyState};
use flowchat::startup::ProxyConfig;
use tokio::task::JoinHandle;

/// Running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start a proxy that forwards to `flowise_url`, or has none configured.
pub async fn start_proxy(flowise_url: Option<String>) -> TestProxy {
    let mut config = ProxyConfig::default();
    if let Some(url) = flowise_url {
        config = config.with_flowise_url(url);
    }
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let state = ProxyState::new(Arc::new(ReqwestHttpClient::new()), config);
    let (handle, addr) = start_proxy_server_on(addr, state)
        .await
        .expect("Failed to start proxy");
    TestProxy { addr, handle }
}

/// Encode agent-flow events as an SSE body.
pub fn sse_body(events: &[&str]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect()
}
