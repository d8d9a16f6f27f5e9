//! HTTP-level provider tests against a mock server.

use futures_util::StreamExt;
use promptrig::{
    Error, FinishReason, LlmRequest, Message, OpenAiProvider, Provider, StreamEvent,
    StreamEventKind,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> LlmRequest {
    LlmRequest::new("gpt-5-mini", vec![Message::user("Say this is a test")])
}

fn provider_for(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::with_base_url("test-key", format!("{}/v1", server.uri())).unwrap()
}

#[tokio::test]
async fn complete_returns_first_choice_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "model": "gpt-5-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "This is a test"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 5, "completion_tokens": 4}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider.complete(&request()).await.unwrap();
    assert_eq!(response.text().as_deref(), Some("This is a test"));
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.input_tokens, 5);
    assert_eq!(response.usage.output_tokens, 4);
}

#[tokio::test]
async fn complete_with_null_content_has_no_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-2",
            "model": "gpt-5-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": null},
                "finish_reason": "content_filter"
            }]
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider.complete(&request()).await.unwrap();
    assert_eq!(response.text(), None);
    assert_eq!(response.finish_reason, FinishReason::ContentFilter);
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    match provider.complete(&request()).await.unwrap_err() {
        Error::Auth(message) => assert!(message.contains("Incorrect API key")),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn rate_limit_maps_to_rate_limit_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached", "type": "tokens"}
        })))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    assert!(matches!(
        provider.complete(&request()).await.unwrap_err(),
        Error::RateLimit
    ));
}

#[tokio::test]
async fn server_error_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    match provider.complete(&request()).await.unwrap_err() {
        Error::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "upstream unavailable");
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

const SSE_BODY: &str = concat!(
    "data: {\"type\":\"response.created\",\"sequence_number\":0,\"response\":{\"id\":\"resp_1\",\"status\":\"in_progress\"}}\n\n",
    "data: {\"type\":\"response.output_text.delta\",\"sequence_number\":1,\"delta\":\"Write \"}\n\n",
    "data: {\"type\":\"response.output_text.delta\",\"sequence_number\":2,\"delta\":\"a haiku\"}\n\n",
    "data: {\"type\":\"response.output_text.done\",\"sequence_number\":3,\"text\":\"Write a haiku\"}\n\n",
    "data: {\"type\":\"response.completed\",\"sequence_number\":4,\"response\":{\"id\":\"resp_1\",\"status\":\"completed\",\"usage\":{\"input_tokens\":6,\"output_tokens\":3}}}\n\n",
    "data: [DONE]\n\n",
);

fn sse_mock() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(SSE_BODY, "text/event-stream")
}

#[tokio::test]
async fn stream_yields_kind_tagged_events_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(sse_mock())
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let mut stream = provider.stream(&request()).await.unwrap();

    let mut kinds = Vec::new();
    while let Some(event) = stream.next().await {
        kinds.push(event.unwrap().kind());
    }
    assert_eq!(
        kinds,
        [
            StreamEventKind::Created,
            StreamEventKind::OutputTextDelta,
            StreamEventKind::OutputTextDelta,
            StreamEventKind::OutputTextDone,
            StreamEventKind::Completed,
        ]
    );
}

#[tokio::test]
async fn stream_collects_into_complete_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(sse_mock())
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let response = provider
        .stream(&request())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(response.text().as_deref(), Some("Write a haiku"));
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.input_tokens, 6);
    assert_eq!(response.usage.output_tokens, 3);
}

#[tokio::test]
async fn dropping_the_stream_releases_the_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(sse_mock())
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    {
        let mut stream = provider.stream(&request()).await.unwrap();
        let first = stream.next_event().await.unwrap().unwrap();
        assert_eq!(first.kind(), StreamEventKind::Created);
        // Handle dropped here with events still pending.
    }

    // The provider is still usable for a fresh request afterwards.
    let response = provider
        .stream(&request())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(response.text().as_deref(), Some("Write a haiku"));
}

#[tokio::test]
async fn failed_stream_event_surfaces_on_collect() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"response.output_text.delta\",\"sequence_number\":0,\"delta\":\"par\"}\n\n",
        "data: {\"type\":\"response.failed\",\"sequence_number\":1,\"response\":{\"id\":\"resp_2\",\"status\":\"failed\",\"error\":{\"code\":\"server_error\",\"message\":\"backend on fire\"}}}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/v1/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let provider = provider_for(&server);
    let err = provider
        .stream(&request())
        .await
        .unwrap()
        .collect()
        .await
        .unwrap_err();
    assert!(err.to_string().contains("backend on fire"));
}
