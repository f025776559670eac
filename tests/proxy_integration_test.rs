//! Integration tests for the HTTP proxy against a fake Flowise upstream.

mod common;

use common::{sse_body, start_proxy};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREDICTION_PATH: &str = "/api/v1/prediction/flow-1";

async fn flowise() -> (MockServer, String) {
    let server = MockServer::start().await;
    let url = format!("{}{}", server.uri(), PREDICTION_PATH);
    (server, url)
}

#[tokio::test]
async fn test_chat_streams_upstream_body_through() {
    let (server, url) = flowise().await;
    let body = sse_body(&[
        r#"{"event":"token","data":"He"}"#,
        r#"{"event":"token","data":"llo"}"#,
        r#"{"event":"end","data":"[DONE]"}"#,
    ]);
    Mock::given(method("POST"))
        .and(path(PREDICTION_PATH))
        .and(body_json(json!({"question": "hi", "streaming": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body.clone()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let proxy = start_proxy(Some(url)).await;
    let response = reqwest::Client::new()
        .post(proxy.url("/api/chat"))
        .json(&json!({"question": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(response.text().await.unwrap(), body);
}

#[tokio::test]
async fn test_chat_mirrors_upstream_error_status() {
    let (server, url) = flowise().await;
    Mock::given(method("POST"))
        .and(path(PREDICTION_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("flow offline"))
        .mount(&server)
        .await;

    let proxy = start_proxy(Some(url)).await;
    let response = reqwest::Client::new()
        .post(proxy.url("/api/chat"))
        .json(&json!({"question": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 503);
    assert_eq!(
        response.text().await.unwrap(),
        "Error from Flowise API: flow offline"
    );
}

#[tokio::test]
async fn test_missing_flowise_url_answers_500() {
    let proxy = start_proxy(None).await;
    let client = reqwest::Client::new();

    for route in ["/api/chat", "/api/chat-fallback"] {
        let response = client
            .post(proxy.url(route))
            .json(&json!({"question": "hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 500, "route {}", route);
        assert_eq!(
            response.text().await.unwrap(),
            "FLOWISE_URL is not set in the environment."
        );
    }
}

#[tokio::test]
async fn test_invalid_request_body_answers_500() {
    let (server, url) = flowise().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let proxy = start_proxy(Some(url)).await;
    let response = reqwest::Client::new()
        .post(proxy.url("/api/chat"))
        .header("content-type", "application/json")
        .body("{\"prompt\": \"hi\"}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "Internal Server Error");
}

#[tokio::test]
async fn test_fallback_returns_upstream_json() {
    let (server, url) = flowise().await;
    Mock::given(method("POST"))
        .and(path(PREDICTION_PATH))
        .and(body_json(json!({"question": "hi", "streaming": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Hello there",
            "chatId": "c-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let proxy = start_proxy(Some(url)).await;
    let response = reqwest::Client::new()
        .post(proxy.url("/api/chat-fallback"))
        .json(&json!({"question": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let value: Value = response.json().await.unwrap();
    assert_eq!(value["text"], "Hello there");
    assert_eq!(value["chatId"], "c-1");
}

#[tokio::test]
async fn test_fallback_mirrors_upstream_error_status() {
    let (server, url) = flowise().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such flow"))
        .mount(&server)
        .await;

    let proxy = start_proxy(Some(url)).await;
    let response = reqwest::Client::new()
        .post(proxy.url("/api/chat-fallback"))
        .json(&json!({"question": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    assert_eq!(
        response.text().await.unwrap(),
        "Error from Flowise API: no such flow"
    );
}

#[tokio::test]
async fn test_upstream_unreachable_answers_500() {
    let proxy = start_proxy(Some("http://127.0.0.1:1/unreachable".to_string())).await;
    let response = reqwest::Client::new()
        .post(proxy.url("/api/chat-fallback"))
        .json(&json!({"question": "hi"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "Internal Server Error");
}

#[tokio::test]
async fn test_health() {
    let proxy = start_proxy(None).await;
    let response = reqwest::get(proxy.url("/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}
