//! Integration tests for the HTTP backends behind `VibeClient`.
//!
//! A wiremock server stands in for the provider API, so these exercise the
//! request shape, response parsing and error-status retry path together.

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{policy, read_fixture};
use vibecheck::{BackendSettings, FunctionCall, FunctionSignature, Provider, VibeClient};

fn settings(server: &MockServer) -> BackendSettings {
    BackendSettings::new("test-key", Duration::from_secs(5)).with_base_url(server.uri())
}

fn json_response(status: u16, fixture: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_raw(read_fixture(fixture), "application/json")
}

#[tokio::test]
async fn test_gemini_statement_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(json_response(200, "gemini/verdict_true.json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = VibeClient::for_provider(
        Provider::Gemini,
        &settings(&server),
        Provider::Gemini.default_model(),
        policy(1),
    )
    .unwrap();

    let verdict = client
        .evaluate_statement("Water boils at 100 degrees Celsius at sea level")
        .await;
    assert_eq!(verdict, Ok(true));
}

#[tokio::test]
async fn test_gemini_rate_limit_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(json_response(429, "gemini/quota_exceeded.json"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(json_response(200, "gemini/fenced_list.json"))
        .expect(1)
        .mount(&server)
        .await;

    // A short base keeps the real-time backoff small
    let policy = vibecheck::RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(10));
    let client =
        VibeClient::for_provider(Provider::Gemini, &settings(&server), "gemini-test", policy)
            .unwrap();

    let call = FunctionCall::new(FunctionSignature::parse("def fruits(n: int) -> list[str]").unwrap())
        .docstring("Name n fruits.")
        .arg(3);
    let value = client.simulate_function(&call).await;

    assert_eq!(value, Ok(json!(["apple", "banana", "cherry"])));
}

#[tokio::test]
async fn test_gemini_persistent_errors_exhaust() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .expect(2)
        .mount(&server)
        .await;

    let policy = vibecheck::RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(1));
    let client =
        VibeClient::for_provider(Provider::Gemini, &settings(&server), "gemini-test", policy)
            .unwrap();

    let err = client.evaluate_statement("X").await.unwrap_err();
    assert_eq!(err.attempts, 2);
}

#[tokio::test]
async fn test_openai_object_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/responses"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(json_response(200, "openai/point_object.json"))
        .expect(1)
        .mount(&server)
        .await;

    let client = VibeClient::for_provider(
        Provider::OpenAi,
        &settings(&server),
        Provider::OpenAi.default_model(),
        policy(1),
    )
    .unwrap();

    let call = FunctionCall::new(
        FunctionSignature::parse("def move_point(x: int, y: int) -> dict[str, json]").unwrap(),
    )
    .arg(1)
    .arg(1);
    let value = client.simulate_function(&call).await;

    assert_eq!(value, Ok(json!({"x": 4, "y": -2, "label": "moved"})));
}
