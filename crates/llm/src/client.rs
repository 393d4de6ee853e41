//! [`ModelCollaborator`] over an OpenAI-compatible chat-completions endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use semantic::{ModelCollaborator, ModelRequest, ModelResponse, TransformError};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::OpenAiConfig;
use crate::errors::LlmConfigError;
use crate::prompt;
use crate::wire::{ChatRequest, ChatResponse, ResponseFormat};

/// Sends each [`ModelRequest`] as one chat completion.
///
/// Wrap it in an `Arc` to share one connection pool between several
/// [`semantic::Semantic`] handles. No retries are made here; inspect
/// [`TransformError::retry_policy`] to build them.
#[derive(Debug)]
pub struct OpenAiCollaborator {
    http: reqwest::Client,
    endpoint: String,
    config: OpenAiConfig,
}

impl OpenAiCollaborator {
    /// Builds the HTTP client for `config`.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmConfigError::Client {
                message: e.to_string(),
            })?;
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        Ok(Self {
            http,
            endpoint,
            config,
        })
    }

    /// Builds an adapter from `OPENAI_*` environment variables.
    pub fn from_env() -> Result<Self, LlmConfigError> {
        Self::new(OpenAiConfig::from_env()?)
    }

    /// The active configuration.
    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }
}

#[async_trait]
impl ModelCollaborator for OpenAiCollaborator {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, TransformError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: prompt::render(&request),
            temperature: self.config.temperature,
            response_format: ResponseFormat::json_object(),
        };
        debug!(
            model = %self.config.model,
            position = ?request.position,
            "sending chat completion"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "chat completion failed");
            return Err(status_error(status, retry_after, message));
        }

        let reply: ChatResponse = response.json().await.map_err(|e| TransformError::Protocol {
            message: format!("reply is not a chat completion: {e}"),
        })?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TransformError::Protocol {
                message: "reply has no message content".to_string(),
            })?;

        Ok(ModelResponse::new(extract_result(&content)))
    }
}

/// Pulls the `result` field out of the model's JSON answer.
///
/// Anything that is not a `{"result": ...}` object is passed through (as a
/// JSON string if it is not JSON at all) so the evaluator's shape check can
/// reject it.
fn extract_result(content: &str) -> Value {
    let content = content.trim();
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(mut fields)) => match fields.remove("result") {
            Some(result) => result,
            None => Value::Object(fields),
        },
        Ok(other) => other,
        Err(_) => Value::String(content.to_string()),
    }
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn status_error(status: StatusCode, retry_after: Option<Duration>, message: String) -> TransformError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        TransformError::RateLimited { retry_after }
    } else if status.is_server_error() {
        TransformError::ServerError {
            status: status.as_u16(),
            message,
        }
    } else {
        TransformError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

fn transport_error(error: reqwest::Error) -> TransformError {
    if error.is_builder() {
        TransformError::failed(format!("request could not be built: {error}"))
    } else {
        TransformError::Unreachable {
            message: error.to_string(),
        }
    }
}
