use crate::response::{CompleteResponse, ResponseStream};
use crate::types::LlmRequest;
use crate::Result;

/// A backend that can execute completion requests.
///
/// `complete` is the synchronous (non-streaming) call; `stream` returns the
/// response as a lazy sequence of typed events.
#[async_trait::async_trait]
pub trait Provider: Send + Sync + 'static {
    /// Execute a completion request and buffer the full response.
    async fn complete(&self, request: &LlmRequest) -> Result<CompleteResponse>;

    /// Execute a completion request, returning a streaming handle.
    async fn stream(&self, request: &LlmRequest) -> Result<ResponseStream>;
}
