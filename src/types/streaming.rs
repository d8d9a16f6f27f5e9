//! Types for streaming responses.

use std::fmt;

use crate::types::{FinishReason, Usage};

/// Events emitted while a response is being generated.
///
/// The stream is lazy, ordered, and finite: it ends after `Completed` or
/// `Failed`, or when the handle is dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The provider accepted the request and opened a response.
    Created,
    /// A chunk of output text was received.
    OutputTextDelta { delta: String },
    /// A text output finished; carries the full accumulated text.
    OutputTextDone { text: String },
    /// The response finished.
    Completed {
        finish_reason: FinishReason,
        usage: Usage,
    },
    /// The provider reported a failure mid-response.
    Failed { message: String },
}

impl StreamEvent {
    /// The kind tag of this event.
    pub fn kind(&self) -> StreamEventKind {
        match self {
            StreamEvent::Created => StreamEventKind::Created,
            StreamEvent::OutputTextDelta { .. } => StreamEventKind::OutputTextDelta,
            StreamEvent::OutputTextDone { .. } => StreamEventKind::OutputTextDone,
            StreamEvent::Completed { .. } => StreamEventKind::Completed,
            StreamEvent::Failed { .. } => StreamEventKind::Failed,
        }
    }
}

/// The kind of a [`StreamEvent`], with its dotted wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamEventKind {
    Created,
    OutputTextDelta,
    OutputTextDone,
    Completed,
    Failed,
}

impl StreamEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEventKind::Created => "response.created",
            StreamEventKind::OutputTextDelta => "response.output_text.delta",
            StreamEventKind::OutputTextDone => "response.output_text.done",
            StreamEventKind::Completed => "response.completed",
            StreamEventKind::Failed => "response.failed",
        }
    }
}

impl fmt::Display for StreamEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
