//! Fallback client.
//!
//! Posts the question to the non-streaming endpoint and normalizes the
//! returned JSON into displayable text.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::error::{ChatError, ChatResult, NetworkError, StreamError};
use crate::traits::{Headers, HttpClient};

/// Fields checked for answer text, in priority order.
const TEXT_FIELDS: [&str; 4] = ["text", "response", "answer", "content"];

/// Extract displayable text from a fallback response body.
///
/// A bare string is the text. Otherwise the first non-empty string among
/// `text`, `response`, `answer`, `content` wins. Anything else is returned
/// serialized so the user sees something.
pub fn extract_text(body: &Value) -> String {
    if let Some(s) = body.as_str() {
        return s.to_string();
    }
    for field in TEXT_FIELDS {
        if let Some(s) = body.get(field).and_then(Value::as_str) {
            if !s.is_empty() {
                return s.to_string();
            }
        }
    }
    body.to_string()
}

#[derive(Clone)]
pub struct FallbackClient {
    http: Arc<dyn HttpClient>,
    url: String,
}

impl FallbackClient {
    pub fn new(http: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one fallback request.
    ///
    /// Transport failures, non-success statuses, unparseable bodies and
    /// empty text are all errors; the caller treats them as "fallback
    /// unavailable".
    pub async fn fetch(&self, question: &str) -> ChatResult<String> {
        let body = json!({ "question": question }).to_string();
        let response = self
            .http
            .post(&self.url, &body, &Headers::new())
            .await
            .map_err(|e| NetworkError::from_http(&self.url, e))?;

        if !response.is_success() {
            return Err(NetworkError::HttpStatus {
                status: response.status,
                message: response.text_lossy(),
            }
            .into());
        }

        let value: Value = response.json().map_err(|e| StreamError::InvalidJson {
            data: response.text_lossy(),
            message: e.to_string(),
        })?;

        let text = extract_text(&value);
        debug!(url = %self.url, len = text.len(), "Fallback response received");
        if text.is_empty() {
            return Err(ChatError::EmptyResult);
        }
        Ok(text)
    }
}

impl std::fmt::Debug for FallbackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackClient").field("url", &self.url).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::HttpError;

    const URL: &str = "http://fallback/api/chat-fallback";

    #[test]
    fn test_shape_normalization() {
        assert_eq!(extract_text(&json!("hello")), "hello");
        assert_eq!(extract_text(&json!({"text": "hello"})), "hello");
        assert_eq!(extract_text(&json!({"response": "hello"})), "hello");
        assert_eq!(extract_text(&json!({"answer": "hello"})), "hello");
        assert_eq!(extract_text(&json!({"content": "hello"})), "hello");
        assert_eq!(extract_text(&json!({"foo": "bar"})), r#"{"foo":"bar"}"#);
    }

    #[test]
    fn test_field_priority() {
        assert_eq!(
            extract_text(&json!({"content": "c", "answer": "a", "text": "t"})),
            "t"
        );
        assert_eq!(extract_text(&json!({"text": "", "answer": "a"})), "a");
        assert_eq!(extract_text(&json!({"text": 5, "content": "c"})), "c");
    }

    #[test]
    fn test_non_object_bodies_serialize() {
        assert_eq!(extract_text(&json!(42)), "42");
        assert_eq!(extract_text(&json!(["a"])), r#"["a"]"#);
    }

    fn client_with(response: MockResponse) -> (FallbackClient, MockHttpClient) {
        let http = MockHttpClient::new();
        http.set_response(URL, response);
        (FallbackClient::new(Arc::new(http.clone()), URL), http)
    }

    #[tokio::test]
    async fn test_fetch_posts_question() {
        let (client, http) = client_with(MockResponse::json(json!({"text": "hello"})));
        assert_eq!(client.fetch("hi").await.unwrap(), "hello");

        let requests = http.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].json(), json!({"question": "hi"}));
    }

    #[tokio::test]
    async fn test_fetch_error_status() {
        let (client, _) = client_with(MockResponse::status(500, "boom"));
        let err = client.fetch("hi").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Network(NetworkError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_transport_failure() {
        let (client, _) = client_with(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));
        assert!(matches!(
            client.fetch("hi").await,
            Err(ChatError::Network(NetworkError::ConnectionFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json() {
        let (client, _) = client_with(MockResponse::status(200, "<html>"));
        assert!(matches!(
            client.fetch("hi").await,
            Err(ChatError::Stream(StreamError::InvalidJson { .. }))
        ));
    }

    #[tokio::test]
    async fn test_fetch_empty_text_is_unusable() {
        let (client, _) = client_with(MockResponse::json(json!("")));
        assert_eq!(client.fetch("hi").await, Err(ChatError::EmptyResult));
    }
}
