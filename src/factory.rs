use std::env;

use crate::providers::openai::{OpenAiProvider, OPENAI_BASE_URL};
use crate::{Error, Provider, Result};

/// Default endpoint for the AI gateway kind.
pub const GATEWAY_BASE_URL: &str = "https://ai-gateway.vercel.sh/v1";

/// Supported provider kinds. Both speak the same wire dialect; they differ
/// in endpoint and credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gateway,
}

/// Configuration for creating providers.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Configuration for the OpenAI endpoint.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::OpenAi,
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Configuration for an OpenAI-compatible AI gateway.
    pub fn gateway(api_key: impl Into<String>) -> Self {
        Self {
            kind: ProviderKind::Gateway,
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Override the endpoint base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Create configuration from environment variables.
    ///
    /// `PROMPTRIG_PROVIDER` selects the kind (`openai` or `gateway`);
    /// `OPENAI_API_KEY` / `AI_GATEWAY_API_KEY` supply credentials. Without an
    /// explicit kind, whichever key is present wins, OpenAI first.
    pub fn from_env() -> Result<Self> {
        if let Ok(kind) = env::var("PROMPTRIG_PROVIDER") {
            return match kind.to_lowercase().as_str() {
                "openai" => {
                    let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
                        Error::config("OPENAI_API_KEY is required for the openai provider")
                    })?;
                    Ok(Self::openai(api_key))
                }
                "gateway" => {
                    let api_key = env::var("AI_GATEWAY_API_KEY").map_err(|_| {
                        Error::config("AI_GATEWAY_API_KEY is required for the gateway provider")
                    })?;
                    Ok(Self::gateway(api_key))
                }
                other => Err(Error::config(format!(
                    "invalid PROMPTRIG_PROVIDER '{other}'; valid values are: openai, gateway"
                ))),
            };
        }

        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            return Ok(Self::openai(api_key));
        }
        if let Ok(api_key) = env::var("AI_GATEWAY_API_KEY") {
            return Ok(Self::gateway(api_key));
        }

        Err(Error::config(
            "no API credentials found in environment; set OPENAI_API_KEY or AI_GATEWAY_API_KEY",
        ))
    }
}

/// Factory for creating providers from configuration.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider from configuration.
    pub fn create(config: &ProviderConfig) -> Result<Box<dyn Provider>> {
        let base_url = match (&config.base_url, config.kind) {
            (Some(url), _) => url.clone(),
            (None, ProviderKind::OpenAi) => OPENAI_BASE_URL.to_string(),
            (None, ProviderKind::Gateway) => GATEWAY_BASE_URL.to_string(),
        };
        let provider = OpenAiProvider::with_base_url(config.api_key.clone(), base_url)?;
        Ok(Box::new(provider))
    }

    /// Create a provider from environment variables.
    pub fn from_env() -> Result<Box<dyn Provider>> {
        let config = ProviderConfig::from_env()?;
        Self::create(&config)
    }
}
