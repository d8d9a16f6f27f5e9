//! Prompt execution on top of a [`Provider`].
//!
//! The runner always streams internally and collects the result, so a single
//! code path serves both "give me the text" and "show me tokens as they
//! arrive" callers.

use std::collections::HashMap;

use uuid::Uuid;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::interpolate::interpolate;
use crate::provider::Provider;
use crate::response::Collector;
use crate::types::{
    FinishReason, GenerationOptions, LlmRequest, Message, SourcePrompt, StreamEvent, Usage,
};
use crate::{factory::ProviderFactory, Result};

/// Model used when a run request does not name one.
pub const DEFAULT_MODEL: &str = "gpt-5-mini";

/// A prompt to execute, with its model and generation knobs.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub options: GenerationOptions,
}

impl RunRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        RunRequest {
            prompt: prompt.into(),
            model: None,
            options: GenerationOptions::default(),
        }
    }

    /// Build a run request from an extracted prompt and its variable values.
    pub fn from_source(prompt: &SourcePrompt, values: &HashMap<String, String>) -> Self {
        Self::new(interpolate(prompt, values))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// The outcome of one prompt run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Generated run id.
    pub id: String,
    /// Response text, `None` when the model produced none.
    pub text: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

/// Executes prompts against a provider.
pub struct PromptRunner {
    provider: Box<dyn Provider>,
}

impl PromptRunner {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self { provider }
    }

    /// Build a runner from environment configuration.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ProviderFactory::from_env()?))
    }

    /// Execute a prompt and return the collected result.
    pub async fn run(&self, request: &RunRequest) -> Result<RunSummary> {
        self.run_with(request, |_| {}).await
    }

    /// Execute a prompt, forwarding each text delta to `on_delta` as it
    /// arrives.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(model = request.model.as_deref().unwrap_or(DEFAULT_MODEL))))]
    pub async fn run_with(
        &self,
        request: &RunRequest,
        mut on_delta: impl FnMut(&str) + Send,
    ) -> Result<RunSummary> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let llm_request = LlmRequest::new(model, vec![Message::user(&request.prompt)])
            .with_options(request.options.clone());

        let mut stream = self.provider.stream(&llm_request).await?;
        let mut collector = Collector::new();
        while let Some(event) = stream.next_event().await {
            let event = event?;
            if let StreamEvent::OutputTextDelta { delta } = &event {
                on_delta(delta);
            }
            if collector.process(event)? {
                break;
            }
        }
        let complete = collector.finish()?;

        Ok(RunSummary {
            id: Uuid::new_v4().to_string(),
            text: complete.text(),
            finish_reason: complete.finish_reason,
            usage: complete.usage,
        })
    }

    /// Interpolate an extracted prompt and execute it.
    pub async fn run_prompt(
        &self,
        prompt: &SourcePrompt,
        values: &HashMap<String, String>,
    ) -> Result<RunSummary> {
        self.run(&RunRequest::from_source(prompt, values)).await
    }
}
