//! Proxy error type and its HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ConfigError;
use crate::traits::HttpError;

/// Errors a proxy route can answer with.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Required configuration is missing
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upstream answered with a non-success status
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Request body is not `{"question": ...}` JSON
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Upstream could not be reached or read
    #[error("upstream request failed: {0}")]
    Transport(HttpError),

    /// Upstream answered 2xx with a body that is not JSON
    #[error("invalid upstream response: {0}")]
    InvalidUpstreamBody(String),
}

impl From<HttpError> for ProxyError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Status { status, body } => ProxyError::Upstream { status, body },
            other => ProxyError::Transport(other),
        }
    }
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Plain-text body sent to the client.
    pub fn body(&self) -> String {
        match self {
            ProxyError::Config(err) => err.to_string(),
            ProxyError::Upstream { body, .. } => format!("Error from Flowise API: {}", body),
            _ => "Internal Server Error".to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::error!(status = status.as_u16(), error = %self, "Proxy request failed");
        (status, self.body()).into_response()
    }
}
