//! Provider clients + retry wrapper against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use secrecy::SecretString;

use farm_assist::config::RetryConfig;
use farm_assist::error::LlmError;
use farm_assist::llm::{
    call_with_retry, AnthropicProvider, ChatMessage, CompletionRequest, FinishReason,
    GeminiProvider, LlmProvider,
};

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay: Duration::from_millis(1),
    }
}

fn request() -> CompletionRequest {
    CompletionRequest::new(vec![
        ChatMessage::system("answer tersely"),
        ChatMessage::user("hello"),
    ])
}

fn gemini_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 4 }
    })
}

#[tokio::test]
async fn gemini_success_round_trip() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/gemini-2.0-flash:generateContent")
            .header("x-goog-api-key", "test-key");
        then.status(200).json_body(gemini_reply("namaste"));
    });

    let provider = GeminiProvider::with_base_url(
        SecretString::from("test-key"),
        "gemini-2.0-flash",
        server.base_url(),
    );
    let response = provider.complete(request()).await.unwrap();

    mock.assert();
    assert_eq!(response.content, "namaste");
    assert_eq!(response.input_tokens, 10);
    assert_eq!(response.finish_reason, FinishReason::Stop);
}

#[tokio::test]
async fn gemini_request_carries_system_instruction() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/models/gemini-2.0-flash:generateContent")
            .json_body_partial(
                r#"{ "systemInstruction": { "parts": [{ "text": "answer tersely" }] } }"#,
            );
        then.status(200).json_body(gemini_reply("ok"));
    });

    let provider = GeminiProvider::with_base_url(
        SecretString::from("test-key"),
        "gemini-2.0-flash",
        server.base_url(),
    );
    provider.complete(request()).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn overloaded_response_retried_until_attempts_exhausted() {
    let server = MockServer::start();
    let overloaded = server.mock(|when, then| {
        when.method(POST).path("/models/m:generateContent");
        then.status(503).body("overloaded");
    });

    let provider: Arc<dyn LlmProvider> = Arc::new(GeminiProvider::with_base_url(
        SecretString::from("k"),
        "m",
        server.base_url(),
    ));

    let result = call_with_retry(&fast_retry(3), || provider.complete(request())).await;
    assert!(matches!(result, Err(LlmError::Overloaded { status: 503, .. })));
    // All three attempts hit the server.
    overloaded.assert_hits(3);
}

#[tokio::test]
async fn bad_request_is_terminal_after_one_attempt() {
    let server = MockServer::start();
    let bad_request = server.mock(|when, then| {
        when.method(POST).path("/models/m:generateContent");
        then.status(400).body("invalid argument");
    });

    let provider: Arc<dyn LlmProvider> = Arc::new(GeminiProvider::with_base_url(
        SecretString::from("k"),
        "m",
        server.base_url(),
    ));

    let result = call_with_retry(&fast_retry(5), || provider.complete(request())).await;
    assert!(matches!(result, Err(LlmError::Http { status: 400, .. })));
    bad_request.assert_hits(1);
}

#[tokio::test]
async fn unauthorized_maps_to_auth_failed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/models/m:generateContent");
        then.status(401).body("bad key");
    });

    let provider = GeminiProvider::with_base_url(SecretString::from("k"), "m", server.base_url());
    let result = provider.complete(request()).await;
    assert!(matches!(result, Err(LlmError::AuthFailed { .. })));
}

#[tokio::test]
async fn anthropic_success_round_trip() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/messages")
            .header("x-api-key", "test-key")
            .header("anthropic-version", "2023-06-01");
        then.status(200).json_body(serde_json::json!({
            "content": [{ "type": "text", "text": "hello farmer" }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 9, "output_tokens": 3 }
        }));
    });

    let provider = AnthropicProvider::with_base_url(
        SecretString::from("test-key"),
        "claude-test",
        server.base_url(),
    );
    let response = provider.complete(request()).await.unwrap();

    mock.assert();
    assert_eq!(response.content, "hello farmer");
    assert_eq!(response.output_tokens, 3);
}

#[tokio::test]
async fn anthropic_overload_status_is_retryable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/messages");
        then.status(529).body("overloaded_error");
    });

    let provider =
        AnthropicProvider::with_base_url(SecretString::from("k"), "claude-test", server.base_url());
    let err = provider.complete(request()).await.unwrap_err();
    assert!(err.is_retryable());
}
