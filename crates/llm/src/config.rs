//! Adapter configuration.

use std::time::Duration;

use secrecy::SecretString;

use crate::errors::LlmConfigError;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug)]
pub struct OpenAiConfig {
    /// Base URL without the `/chat/completions` suffix.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub api_key: SecretString,
    /// Model name sent with every request.
    pub model: String,
    /// Sampling temperature; `None` leaves the provider default.
    pub temperature: Option<f32>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl OpenAiConfig {
    /// Configuration for the public endpoint with default model and timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(0.0),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Points the adapter at another OpenAI-compatible server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Selects the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets (or clears) the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the configuration from the process environment.
    ///
    /// | Variable | Required | Default |
    /// |----------|----------|---------|
    /// | `OPENAI_API_KEY` | yes | |
    /// | `OPENAI_BASE_URL` | no | [`DEFAULT_BASE_URL`] |
    /// | `OPENAI_MODEL` | no | [`DEFAULT_MODEL`] |
    /// | `OPENAI_TIMEOUT_SECS` | no | 60 |
    pub fn from_env() -> Result<Self, LlmConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, LlmConfigError> {
        let present = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = present("OPENAI_API_KEY").ok_or(LlmConfigError::MissingVariable {
            name: "OPENAI_API_KEY",
        })?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = present("OPENAI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Some(model) = present("OPENAI_MODEL") {
            config = config.with_model(model);
        }
        if let Some(raw) = present("OPENAI_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|e| LlmConfigError::InvalidValue {
                    name: "OPENAI_TIMEOUT_SECS",
                    message: e.to_string(),
                })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}
