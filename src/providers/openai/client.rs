use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::types::{
    ApiErrorBody, ChatCompletionsRequest, ChatCompletionsResponse, ResponsesRequest,
    ResponsesStreamEvent, WireMessage,
};
use crate::provider::Provider;
use crate::response::{CompleteResponse, ResponseStream};
use crate::sse::SseStreamExt;
use crate::types::{FinishReason, LlmRequest, StreamEvent};
use crate::{Error, Result};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Provider speaking the OpenAI wire dialect. Also covers OpenAI-compatible
/// gateways via [`OpenAiProvider::with_base_url`].
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a provider against the default OpenAI endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, OPENAI_BASE_URL)
    }

    /// Create a provider against a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chat_request(&self, request: &LlmRequest) -> ChatCompletionsRequest {
        let options = &request.options;
        ChatCompletionsRequest {
            model: request.model.clone(),
            messages: request.input.iter().map(Self::wire_message).collect(),
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_output_tokens,
            stop: options.stop_sequences.clone(),
            presence_penalty: options.presence_penalty,
            frequency_penalty: options.frequency_penalty,
            seed: options.seed,
            stream: None,
        }
    }

    fn responses_request(&self, request: &LlmRequest) -> ResponsesRequest {
        let options = &request.options;
        ResponsesRequest {
            model: request.model.clone(),
            input: request.input.iter().map(Self::wire_message).collect(),
            temperature: options.temperature,
            top_p: options.top_p,
            max_output_tokens: options.max_output_tokens,
            stream: Some(true),
            store: Some(false),
        }
    }

    fn wire_message(message: &crate::types::Message) -> WireMessage {
        WireMessage {
            role: message.role,
            content: message.content.clone(),
        }
    }

    /// Map a wire event to a typed [`StreamEvent`]; `None` for event types
    /// that carry nothing the caller acts on.
    fn convert_stream_event(event: ResponsesStreamEvent) -> Option<StreamEvent> {
        match event.r#type.as_str() {
            "response.created" => Some(StreamEvent::Created),
            "response.output_text.delta" => event
                .delta
                .filter(|delta| !delta.is_empty())
                .map(|delta| StreamEvent::OutputTextDelta { delta }),
            "response.output_text.done" => {
                event.text.map(|text| StreamEvent::OutputTextDone { text })
            }
            "response.completed" | "response.incomplete" => {
                let envelope = event.response;
                let finish_reason = match envelope
                    .as_ref()
                    .and_then(|r| r.incomplete_details.as_ref())
                    .and_then(|d| d.reason.as_deref())
                {
                    Some("max_output_tokens") => FinishReason::Length,
                    Some("content_filter") => FinishReason::ContentFilter,
                    _ => FinishReason::Stop,
                };
                let usage = envelope
                    .and_then(|r| r.usage)
                    .map(|u| u.into_usage())
                    .unwrap_or_default();
                Some(StreamEvent::Completed {
                    finish_reason,
                    usage,
                })
            }
            "response.failed" | "error" => {
                let message = event
                    .response
                    .and_then(|r| r.error)
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "response failed".to_string());
                Some(StreamEvent::Failed { message })
            }
            _ => None,
        }
    }

    /// Turn a non-success response into the matching error variant, pulling
    /// the server's error message out of the body when it parses.
    async fn api_error(response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);
        Error::from_status(status, message)
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    #[cfg_attr(feature = "tracing", instrument(skip(self, request), fields(model = %request.model)))]
    async fn complete(&self, request: &LlmRequest) -> Result<CompleteResponse> {
        let body = self.chat_request(request);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let wire: ChatCompletionsResponse = response.json().await?;

        let mut output = Vec::new();
        let mut finish_reason = FinishReason::Stop;
        if let Some(choice) = wire.choices.into_iter().next() {
            finish_reason = match choice.finish_reason.as_deref() {
                Some("length") => FinishReason::Length,
                Some("content_filter") => FinishReason::ContentFilter,
                _ => FinishReason::Stop,
            };
            if let Some(content) = choice.message.content {
                if !content.is_empty() {
                    output.push(content);
                }
            }
        }

        Ok(CompleteResponse {
            output,
            finish_reason,
            usage: wire.usage.map(|u| u.into_usage()).unwrap_or_default(),
        })
    }

    #[cfg_attr(feature = "tracing", instrument(skip(self, request), fields(model = %request.model)))]
    async fn stream(&self, request: &LlmRequest) -> Result<ResponseStream> {
        let body = self.responses_request(request);
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }

        let events = Box::pin(response.bytes_stream())
            .sse_events()
            .filter_map(|sse| async move {
                match sse {
                    Ok(event) => {
                        if event.is_done() {
                            return None;
                        }
                        match serde_json::from_str::<ResponsesStreamEvent>(&event.data) {
                            Ok(wire) => Self::convert_stream_event(wire).map(Ok),
                            // Not every SSE record is a payload we know; skip.
                            Err(_) => None,
                        }
                    }
                    Err(e) => Some(Err(e)),
                }
            });

        Ok(ResponseStream::from_stream(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenerationOptions, Message};

    fn request() -> LlmRequest {
        LlmRequest::new("gpt-5-mini", vec![Message::user("Say this is a test")])
            .with_options(GenerationOptions::default().temperature(0.7).max_output_tokens(100))
    }

    #[test]
    fn provider_creation() {
        assert!(OpenAiProvider::new("test-key").is_ok());
        let provider = OpenAiProvider::with_base_url("k", "http://localhost:9999/v1/").unwrap();
        assert_eq!(provider.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn chat_request_conversion() {
        let provider = OpenAiProvider::new("test-key").unwrap();
        let wire = provider.chat_request(&request());
        assert_eq!(wire.model, "gpt-5-mini");
        assert_eq!(wire.messages.len(), 1);
        assert_eq!(wire.temperature, Some(0.7));
        assert_eq!(wire.max_tokens, Some(100));
        assert_eq!(wire.stream, None);
    }

    #[test]
    fn responses_request_always_streams() {
        let provider = OpenAiProvider::new("test-key").unwrap();
        let wire = provider.responses_request(&request());
        assert_eq!(wire.stream, Some(true));
        assert_eq!(wire.max_output_tokens, Some(100));
    }

    #[test]
    fn stream_event_conversion() {
        let delta: ResponsesStreamEvent = serde_json::from_str(
            r#"{"type":"response.output_text.delta","sequence_number":3,"delta":"Hi"}"#,
        )
        .unwrap();
        assert_eq!(
            OpenAiProvider::convert_stream_event(delta),
            Some(StreamEvent::OutputTextDelta { delta: "Hi".into() })
        );

        let created: ResponsesStreamEvent =
            serde_json::from_str(r#"{"type":"response.created","response":{"id":"resp_1"}}"#)
                .unwrap();
        assert_eq!(
            OpenAiProvider::convert_stream_event(created),
            Some(StreamEvent::Created)
        );

        let unknown: ResponsesStreamEvent =
            serde_json::from_str(r#"{"type":"response.in_progress"}"#).unwrap();
        assert_eq!(OpenAiProvider::convert_stream_event(unknown), None);
    }

    #[test]
    fn completed_event_maps_usage_and_reason() {
        let completed: ResponsesStreamEvent = serde_json::from_str(
            r#"{
                "type": "response.incomplete",
                "response": {
                    "id": "resp_1",
                    "status": "incomplete",
                    "incomplete_details": {"reason": "max_output_tokens"},
                    "usage": {"input_tokens": 10, "output_tokens": 5}
                }
            }"#,
        )
        .unwrap();
        match OpenAiProvider::convert_stream_event(completed) {
            Some(StreamEvent::Completed {
                finish_reason,
                usage,
            }) => {
                assert_eq!(finish_reason, FinishReason::Length);
                assert_eq!(usage.input_tokens, 10);
                assert_eq!(usage.output_tokens, 5);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
