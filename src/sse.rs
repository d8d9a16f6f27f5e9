//! Incremental Server-Sent Events decoding for streaming response bodies.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::{Stream, StreamExt};
use memchr::memchr_iter;

use crate::Error;

/// Upper bound on buffered bytes for a single event. A response that never
/// produces a blank line must not grow the buffer without bound.
const MAX_EVENT_BYTES: usize = 1_000_000;

/// A decoded Server-Sent Events record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// `event:` field, when present.
    pub event: Option<String>,
    /// Joined `data:` lines.
    pub data: String,
    /// `id:` field, when present.
    pub id: Option<String>,
    /// `retry:` field in milliseconds, when present and numeric.
    pub retry: Option<u64>,
}

impl SseEvent {
    /// The `[DONE]` sentinel ending an OpenAI-style stream.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Incremental SSE decoder. Feed it raw chunks as they arrive; it hands back
/// every event completed so far, reassembling events (and UTF-8 sequences)
/// split across chunk boundaries.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain all events it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<SseEvent>, Error> {
        self.buf.extend_from_slice(chunk);
        if self.buf.len() > MAX_EVENT_BYTES {
            self.buf.clear();
            return Err(Error::streaming("SSE buffer exceeded maximum size"));
        }

        let mut events = Vec::new();
        let mut start = 0;

        loop {
            match find_blank_line(&self.buf[start..]) {
                Some((end, sep_len)) => {
                    let event_bytes = &self.buf[start..start + end];
                    if let Some(event) = Self::decode_block(event_bytes)? {
                        events.push(event);
                    }
                    start += end + sep_len;
                }
                None => break,
            }
        }

        if start > 0 {
            self.buf.drain(..start);
        }
        Ok(events)
    }

    /// Flush a trailing event at end of stream. Some servers end the body
    /// without a final blank line; the leftover block is still an event.
    pub fn finish(&mut self) -> Result<Option<SseEvent>, Error> {
        if self.buf.is_empty() {
            return Ok(None);
        }
        let tail = std::mem::take(&mut self.buf);
        Self::decode_block(&tail)
    }

    fn decode_block(bytes: &[u8]) -> Result<Option<SseEvent>, Error> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::streaming(format!("invalid UTF-8 in SSE event: {e}")))?;

        let mut event = None;
        let mut data_lines: Vec<&str> = Vec::new();
        let mut id = None;
        let mut retry = None;

        for line in text.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                // A line without a colon is a field with an empty value.
                None => (line, ""),
            };
            match field {
                "event" => event = Some(value.to_string()),
                "data" => data_lines.push(value),
                "id" => id = Some(value.to_string()),
                "retry" => retry = value.parse().ok(),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(SseEvent {
            event,
            data: data_lines.join("\n"),
            id,
            retry,
        }))
    }
}

/// Find the first blank line in `bytes`. Returns the byte offset where the
/// event block ends and the separator length, handling both LF and CRLF.
fn find_blank_line(bytes: &[u8]) -> Option<(usize, usize)> {
    for i in memchr_iter(b'\n', bytes) {
        match bytes.get(i + 1) {
            Some(b'\n') => return Some((i + 1, 1)),
            Some(b'\r') if bytes.get(i + 2) == Some(&b'\n') => return Some((i + 1, 2)),
            _ => {}
        }
    }
    None
}

/// A `Stream` adapter decoding SSE events out of a byte stream.
pub struct SseStream<S> {
    inner: S,
    decoder: SseDecoder,
    ready: VecDeque<SseEvent>,
    eof: bool,
}

impl<S> SseStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            decoder: SseDecoder::new(),
            ready: VecDeque::new(),
            eof: false,
        }
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.ready.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.eof {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => match self.decoder.push(&chunk) {
                    Ok(events) => self.ready.extend(events),
                    Err(e) => return Poll::Ready(Some(Err(e))),
                },
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(Error::streaming(format!(
                        "stream error: {}",
                        e.into()
                    )))));
                }
                None => {
                    self.eof = true;
                    match self.decoder.finish() {
                        Ok(Some(event)) => self.ready.push_back(event),
                        Ok(None) => {}
                        Err(e) => return Poll::Ready(Some(Err(e))),
                    }
                }
            }
        }
    }
}

/// Extension trait to decode byte streams as SSE events.
pub trait SseStreamExt: Stream {
    fn sse_events(self) -> SseStream<Self>
    where
        Self: Sized,
    {
        SseStream::new(self)
    }
}

impl<S: Stream> SseStreamExt for S {}
