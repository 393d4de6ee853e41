//! Port to the external model collaborator.
//!
//! The evaluator depends only on [`ModelCollaborator`]. Transport,
//! authentication, prompt wording and provider quirks live in adapter crates
//! (see the `llm` crate for an OpenAI-compatible implementation).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::TransformError;
use crate::types::{IndexContext, Instruction, ResultShape};

/// One request to the model: "apply `instruction` to `item`, answer in `shape`".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// Textual representation of the item.
    pub item: String,
    /// What to decide, classify or produce.
    pub instruction: Instruction,
    /// Position of the item in its sequence; `None` for single-item calls.
    pub position: Option<IndexContext>,
    /// The answer shape the evaluator will accept.
    pub shape: ResultShape,
}

/// The model's raw structured answer.
///
/// `value` is checked against the request's [`ResultShape`] by the evaluator;
/// collaborators should pass the answer through rather than coerce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The answer, as JSON.
    pub value: Value,
}

impl ModelResponse {
    /// Wraps a raw answer.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A language model that can answer one [`ModelRequest`].
///
/// Implementations must be safe to call concurrently: the mapper keeps up to
/// `max_parallel` requests outstanding against one collaborator.
#[async_trait]
pub trait ModelCollaborator: Send + Sync {
    /// Sends one request and returns the model's answer.
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, TransformError>;
}

#[async_trait]
impl<M: ModelCollaborator + ?Sized> ModelCollaborator for Arc<M> {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, TransformError> {
        (**self).complete(request).await
    }
}

#[async_trait]
impl<M: ModelCollaborator + ?Sized> ModelCollaborator for Box<M> {
    async fn complete(&self, request: ModelRequest) -> Result<ModelResponse, TransformError> {
        (**self).complete(request).await
    }
}
