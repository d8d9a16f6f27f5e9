//! Response handling for completions, buffered and streamed.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::{Stream, StreamExt};

use crate::types::{FinishReason, StreamEvent, Usage};
use crate::{Error, Result};

/// A complete, buffered response.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteResponse {
    /// Ordered text outputs. Usually one; empty when the model produced no
    /// text (e.g. a filtered response).
    pub output: Vec<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl CompleteResponse {
    /// All text content concatenated.
    pub fn content(&self) -> String {
        self.output.concat()
    }

    /// The text content, `None` when the response carried none.
    pub fn text(&self) -> Option<String> {
        if self.output.iter().all(|s| s.is_empty()) {
            None
        } else {
            Some(self.content())
        }
    }
}

/// The handle to an in-flight streaming response.
///
/// Events arrive lazily and in order; the sequence is finite. Dropping the
/// handle releases the underlying connection, whether or not the stream was
/// exhausted.
pub struct ResponseStream {
    inner: Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>,
}

impl ResponseStream {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamEvent>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// Await the next event, `None` once the stream is exhausted.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent>> {
        self.inner.next().await
    }

    /// Consume the remaining events into a buffered response.
    pub async fn collect(mut self) -> Result<CompleteResponse> {
        let mut collector = Collector::new();
        while let Some(event) = self.inner.next().await {
            if collector.process(event?)? {
                break;
            }
        }
        collector.finish()
    }
}

impl Stream for ResponseStream {
    type Item = Result<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Folds stream events into a [`CompleteResponse`].
#[derive(Debug, Default)]
pub struct Collector {
    output: Vec<String>,
    /// Whether the last output entry is still receiving deltas.
    open: bool,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    failure: Option<String>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event. Returns `true` once the response is terminal and no
    /// further events are expected.
    pub fn process(&mut self, event: StreamEvent) -> Result<bool> {
        match event {
            StreamEvent::Created => {}
            StreamEvent::OutputTextDelta { delta } => {
                match self.output.last_mut() {
                    Some(text) if self.open => text.push_str(&delta),
                    _ => self.output.push(delta),
                }
                self.open = true;
            }
            StreamEvent::OutputTextDone { text } => {
                // The provider's final text is authoritative over whatever
                // deltas we managed to collect.
                match self.output.last_mut() {
                    Some(last) if self.open => *last = text,
                    _ => self.output.push(text),
                }
                self.open = false;
            }
            StreamEvent::Completed {
                finish_reason,
                usage,
            } => {
                self.finish_reason = Some(finish_reason);
                self.usage = Some(usage);
                return Ok(true);
            }
            StreamEvent::Failed { message } => {
                self.failure = Some(message);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Current accumulated text, for callers peeking mid-stream.
    pub fn current_content(&self) -> String {
        self.output.concat()
    }

    pub fn finish(self) -> Result<CompleteResponse> {
        if let Some(message) = self.failure {
            return Err(Error::streaming(message));
        }
        Ok(CompleteResponse {
            output: self.output,
            finish_reason: self.finish_reason.unwrap_or(FinishReason::Stop),
            usage: self.usage.unwrap_or_default(),
        })
    }
}
