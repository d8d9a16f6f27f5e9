//! Find prompts embedded in source code, interpolate them, and run them
//! against an LLM provider.
//!
//! The pieces compose but stand alone: [`extract_prompts`] scans TypeScript,
//! JavaScript, and Python sources for `@prompt`-annotated or prompt-named
//! string literals; [`interpolate`] substitutes variable values into an
//! extracted prompt; [`PromptRunner`] executes prompt text through a
//! [`Provider`], either buffered or as a stream of typed events.

pub mod error;
pub mod extract;
pub mod factory;
pub mod interpolate;
pub mod provider;
pub mod providers;
pub mod response;
pub mod runner;
pub mod sse;
pub mod types;

// Re-export core types for easy usage
pub use error::{Error, Result};
pub use extract::{extract_prompts, Language};
pub use factory::{ProviderConfig, ProviderFactory, ProviderKind};
pub use interpolate::interpolate;
pub use provider::Provider;
pub use providers::OpenAiProvider;
pub use response::{Collector, CompleteResponse, ResponseStream};
pub use runner::{PromptRunner, RunRequest, RunSummary, DEFAULT_MODEL};
pub use sse::SseEvent;
pub use types::*;
