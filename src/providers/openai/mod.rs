//! OpenAI-dialect provider: non-streaming chat completions and streaming
//! responses over SSE. The same wire shapes cover OpenAI-compatible gateways
//! behind a different base URL.

mod client;
mod types;

pub use client::{OpenAiProvider, OPENAI_BASE_URL};
