//! Mock HTTP client for testing.
//!
//! Responses are configured per URL. Streaming responses are scripted step
//! by step so tests can place chunks, pauses and failures on the tokio
//! clock, which `#[tokio::test(start_paused = true)]` advances instantly.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: String,
}

impl RecordedRequest {
    /// Request body parsed as JSON; `Null` when it is not JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }
}

/// One step of a scripted response stream.
#[derive(Debug, Clone)]
pub enum StreamStep {
    /// Deliver a chunk
    Chunk(Bytes),
    /// Pause before the next step
    Wait(Duration),
    /// Fail the stream with a transport error
    Fail(HttpError),
    /// Never deliver anything again
    Hang,
}

impl StreamStep {
    pub fn chunk(data: impl Into<Bytes>) -> Self {
        StreamStep::Chunk(data.into())
    }

    pub fn wait_ms(ms: u64) -> Self {
        StreamStep::Wait(Duration::from_millis(ms))
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a buffered response
    Success(Response),
    /// Fail the request itself
    Error(HttpError),
    /// Stream the chunks immediately, then close
    Stream(Vec<Bytes>),
    /// Stream according to a script
    Script(Vec<StreamStep>),
    /// Wait before producing the inner response
    Delayed(Duration, Box<MockResponse>),
}

impl MockResponse {
    /// JSON body with status 200.
    pub fn json(value: serde_json::Value) -> Self {
        MockResponse::Success(Response::json_body(200, &value))
    }

    /// Plain body with the given status.
    pub fn status(status: u16, body: &str) -> Self {
        MockResponse::Success(Response::new(status, Bytes::from(body.to_string())))
    }

    pub fn delayed(self, delay: Duration) -> Self {
        MockResponse::Delayed(delay, Box::new(self))
    }
}

/// Mock HTTP client for testing.
///
/// Clones share configured responses and recorded requests.
///
/// # Example
///
/// ```ignore
/// use flowchat::adapters::mock::{MockHttpClient, MockResponse, StreamStep};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "http://primary/api/chat",
///     MockResponse::Script(vec![
///         StreamStep::chunk("data: {\"event\":\"token\",\"data\":\"He\"}\n\n"),
///         StreamStep::Hang,
///     ]),
/// );
/// client.set_response("http://fallback", MockResponse::json(json!({"text": "hi"})));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by exact URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a specific URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests made to `url`.
    pub fn request_count(&self, url: &str) -> usize {
        lock(&self.requests).iter().filter(|r| r.url == url).count()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        lock(&self.requests).push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        if let Some(response) = lock(&self.responses).get(url) {
            return Some(response.clone());
        }
        lock(&self.default_response).clone()
    }

    /// Unwrap `Delayed` layers, sleeping for each.
    async fn resolve(&self, url: &str) -> Option<MockResponse> {
        let mut response = self.get_response(url)?;
        while let MockResponse::Delayed(delay, inner) = response {
            tokio::time::sleep(delay).await;
            response = *inner;
        }
        Some(response)
    }
}

fn scripted_stream(steps: Vec<StreamStep>) -> ByteStream {
    let steps: VecDeque<StreamStep> = steps.into();
    Box::pin(futures::stream::unfold(steps, |mut steps| async move {
        loop {
            match steps.pop_front()? {
                StreamStep::Chunk(bytes) => return Some((Ok(bytes), steps)),
                StreamStep::Wait(delay) => tokio::time::sleep(delay).await,
                StreamStep::Fail(err) => {
                    steps.clear();
                    return Some((Err(err), steps));
                }
                StreamStep::Hang => futures::future::pending::<()>().await,
            }
        }
    }))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request(url, headers, body);

        match self.resolve(url).await {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Stream(_)) | Some(MockResponse::Script(_)) => Err(
                HttpError::Other("Stream response on non-stream request".to_string()),
            ),
            Some(MockResponse::Delayed(..)) | None => {
                Err(HttpError::Other(format!("No mock response for URL: {}", url)))
            }
        }
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError> {
        self.record_request(url, headers, body);

        match self.resolve(url).await {
            Some(MockResponse::Stream(chunks)) => {
                Ok(Box::pin(futures::stream::iter(
                    chunks.into_iter().map(Ok::<Bytes, HttpError>),
                )))
            }
            Some(MockResponse::Script(steps)) => Ok(scripted_stream(steps)),
            Some(MockResponse::Success(response)) if response.is_success() => {
                Ok(Box::pin(futures::stream::iter(vec![Ok::<Bytes, HttpError>(
                    response.body,
                )])))
            }
            Some(MockResponse::Success(response)) => Err(HttpError::Status {
                status: response.status,
                body: response.text_lossy(),
            }),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Delayed(..)) | None => {
                Err(HttpError::Other(format!("No mock response for URL: {}", url)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_post_with_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://fallback",
            MockResponse::json(serde_json::json!({"text": "hello"})),
        );

        let response = client
            .post("http://fallback", r#"{"question":"hi"}"#, &Headers::new())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].json()["question"], "hi");
        assert_eq!(client.request_count("http://fallback"), 1);
        assert_eq!(client.request_count("http://other"), 0);
    }

    #[tokio::test]
    async fn test_no_response_configured() {
        let client = MockHttpClient::new();
        let result = client.post("http://missing", "{}", &Headers::new()).await;
        assert!(matches!(result, Err(HttpError::Other(_))));
    }

    #[tokio::test]
    async fn test_stream_chunks() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://primary",
            MockResponse::Stream(vec![Bytes::from("a"), Bytes::from("b")]),
        );

        let chunks: Vec<Bytes> = client
            .post_stream("http://primary", "{}", &Headers::new())
            .await
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(chunks, vec![Bytes::from("a"), Bytes::from("b")]);
    }

    #[tokio::test]
    async fn test_error_status_on_stream_request() {
        let client = MockHttpClient::new();
        client.set_response("http://primary", MockResponse::status(500, "boom"));

        let result = client
            .post_stream("http://primary", "{}", &Headers::new())
            .await;
        assert!(matches!(
            result,
            Err(HttpError::Status { status: 500, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_script_respects_waits() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://primary",
            MockResponse::Script(vec![
                StreamStep::chunk("one"),
                StreamStep::wait_ms(1000),
                StreamStep::chunk("two"),
                StreamStep::Fail(HttpError::Io("reset".to_string())),
                StreamStep::chunk("never"),
            ]),
        );

        let start = tokio::time::Instant::now();
        let mut stream = client
            .post_stream("http://primary", "{}", &Headers::new())
            .await
            .unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from("one"));
        assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from("two"));
        assert!(start.elapsed() >= Duration::from_millis(1000));
        assert!(matches!(stream.next().await, Some(Err(HttpError::Io(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hang_never_yields() {
        let client = MockHttpClient::new();
        client.set_response("http://primary", MockResponse::Script(vec![StreamStep::Hang]));

        let mut stream = client
            .post_stream("http://primary", "{}", &Headers::new())
            .await
            .unwrap();
        let next = tokio::time::timeout(Duration::from_secs(60), stream.next()).await;
        assert!(next.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_response() {
        let client = MockHttpClient::new();
        client.set_response(
            "http://fallback",
            MockResponse::json(serde_json::json!("late")).delayed(Duration::from_millis(500)),
        );

        let start = tokio::time::Instant::now();
        let response = client
            .post("http://fallback", "{}", &Headers::new())
            .await
            .unwrap();
        assert!(response.is_success());
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::status(404, "Not Found"));

        let cloned = client.clone();
        let response = cloned
            .post("http://anything", "{}", &Headers::new())
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(client.get_requests().len(), 1);
        client.clear_requests();
        assert!(cloned.get_requests().is_empty());
    }
}
