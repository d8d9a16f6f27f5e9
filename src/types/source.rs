use serde::{Deserialize, Serialize};

/// A half-open byte range into a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Paired spans for a delimited region: `outer` includes the delimiters
/// (quotes, `${`..`}`), `inner` covers only the content between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanPair {
    pub outer: Span,
    pub inner: Span,
}

impl SpanPair {
    pub fn new(outer: Span, inner: Span) -> Self {
        SpanPair { outer, inner }
    }
}

/// A variable placeholder inside a prompt, e.g. `${user.name}` in a template
/// literal or `{name}` in an f-string. `exp` is the placeholder's expression
/// text, verbatim from the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVar {
    pub exp: String,
    pub span: SpanPair,
}

/// A prompt definition found in a source file.
///
/// `content` is the literal's inner text, escapes left verbatim so that
/// `span` and the vars' spans stay aligned with the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePrompt {
    pub file: String,
    pub content: String,
    pub span: SpanPair,
    pub vars: Vec<PromptVar>,
}
