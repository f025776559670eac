//! Proxy server implementation.
//!
//! Forwards chat requests to the hosted agent. `/api/chat` streams the
//! upstream SSE body through unchanged; `/api/chat-fallback` asks for a
//! single JSON document.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use super::error::ProxyError;
use crate::startup::config::ProxyConfig;
use crate::traits::{Headers, HttpClient};

/// Shared state for the proxy handlers.
#[derive(Clone)]
pub struct ProxyState {
    pub http: Arc<dyn HttpClient>,
    pub config: Arc<ProxyConfig>,
}

impl ProxyState {
    pub fn new(http: Arc<dyn HttpClient>, config: ProxyConfig) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuestionRequest {
    question: String,
}

fn parse_question(body: &Bytes) -> Result<String, ProxyError> {
    serde_json::from_slice::<QuestionRequest>(body)
        .map(|req| req.question)
        .map_err(|e| ProxyError::InvalidBody(e.to_string()))
}

fn upstream_body(question: &str, streaming: bool) -> String {
    json!({ "question": question, "streaming": streaming }).to_string()
}

/// Build the proxy router.
pub fn router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/api/chat-fallback", post(chat_fallback_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Start the proxy server on `addr`.
///
/// Returns the server task and the bound address, which differs from `addr`
/// when binding port 0.
pub async fn start_proxy_server_on(
    addr: SocketAddr,
    state: ProxyState,
) -> color_eyre::Result<(JoinHandle<()>, SocketAddr)> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Proxy listening on http://{}", actual_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Proxy server error: {}", e);
        }
    });

    Ok((handle, actual_addr))
}

/// Run the proxy until the server task ends.
pub async fn serve(http: Arc<dyn HttpClient>, config: ProxyConfig) -> color_eyre::Result<()> {
    if config.flowise_url.is_none() {
        tracing::warn!("FLOWISE_URL is not set; chat routes will answer 500");
    }
    let bind = config.bind;
    let (handle, _) = start_proxy_server_on(bind, ProxyState::new(http, config)).await?;
    handle.await?;
    Ok(())
}

async fn chat_handler(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let question = parse_question(&body)?;
    let url = state.config.require_flowise_url()?;
    tracing::debug!(question_len = question.len(), "Proxying streaming chat request");

    let stream = state
        .http
        .post_stream(url, &upstream_body(&question, true), &Headers::new())
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(stream),
    )
        .into_response())
}

async fn chat_fallback_handler(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let question = parse_question(&body)?;
    let url = state.config.require_flowise_url()?;
    tracing::info!(question_len = question.len(), "Proxying fallback chat request");

    let response = state
        .http
        .post(url, &upstream_body(&question, false), &Headers::new())
        .await?;

    if !response.is_success() {
        return Err(ProxyError::Upstream {
            status: response.status,
            body: response.text_lossy(),
        });
    }

    let value: Value = response
        .json()
        .map_err(|e| ProxyError::InvalidUpstreamBody(e.to_string()))?;
    Ok((StatusCode::OK, Json(value)).into_response())
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
