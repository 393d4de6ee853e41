//! Semantic evaluator: one item, one instruction, one model call.

use std::pin::pin;

use futures::future::{self, Either};
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::decode::ResultDecoder;
use crate::errors::{SemanticError, TransformError};
use crate::ports::{ModelCollaborator, ModelRequest};
use crate::types::{IndexContext, Instruction, SemanticResult, SemanticValue};

/// Renders an item as the text sent to the model.
///
/// Strings are sent verbatim; anything else is sent as compact JSON.
pub fn item_text<T: Serialize + ?Sized>(item: &T) -> Result<String, TransformError> {
    match serde_json::to_value(item) {
        Ok(Value::String(text)) => Ok(text),
        Ok(other) => Ok(other.to_string()),
        Err(e) => Err(TransformError::failed(format!(
            "item could not be serialized: {e}"
        ))),
    }
}

/// Asks a [`ModelCollaborator`] for one decision per call.
///
/// Stateless: a single evaluator may be shared by every slot of a mapper call.
#[derive(Debug, Clone)]
pub struct SemanticEvaluator<M> {
    model: M,
}

impl<M: ModelCollaborator> SemanticEvaluator<M> {
    /// Creates an evaluator backed by `model`.
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// The underlying collaborator.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Evaluates an item that is part of a sequence.
    ///
    /// The request carries `index`, so positional instructions can be
    /// honoured, and the result is tagged with `index.index()`.
    pub async fn evaluate<T, D>(
        &self,
        item: &T,
        index: IndexContext,
        instruction: &Instruction,
        decoder: &D,
        cancel: &CancellationToken,
    ) -> Result<SemanticResult<D::Output>, SemanticError>
    where
        T: Serialize + ?Sized,
        D: ResultDecoder,
    {
        let value = self
            .run(item, index.index(), Some(index), instruction, decoder, cancel)
            .await?;
        Ok(SemanticResult {
            position: index.index(),
            value,
        })
    }

    /// Evaluates a lone item. No position is sent to the model.
    pub async fn evaluate_single<T, D>(
        &self,
        item: &T,
        instruction: &Instruction,
        decoder: &D,
        cancel: &CancellationToken,
    ) -> Result<D::Output, SemanticError>
    where
        T: Serialize + ?Sized,
        D: ResultDecoder,
    {
        self.run(item, 0, None, instruction, decoder, cancel).await
    }

    async fn run<T, D>(
        &self,
        item: &T,
        position: usize,
        context: Option<IndexContext>,
        instruction: &Instruction,
        decoder: &D,
        cancel: &CancellationToken,
    ) -> Result<D::Output, SemanticError>
    where
        T: Serialize + ?Sized,
        D: ResultDecoder,
    {
        if cancel.is_cancelled() {
            return Err(SemanticError::Cancelled);
        }

        let text =
            item_text(item).map_err(|source| SemanticError::Transform { position, source })?;
        let shape = decoder.shape();
        let request = ModelRequest {
            item: text,
            instruction: instruction.clone(),
            position: context,
            shape: shape.clone(),
        };

        // `select` polls the left future first, so a fired token always wins.
        let cancelled = pin!(cancel.cancelled());
        let call = pin!(self.model.complete(request));
        let outcome = match future::select(cancelled, call).await {
            Either::Left(((), _)) => return Err(SemanticError::Cancelled),
            Either::Right((outcome, _)) => outcome,
        };
        let response = outcome.map_err(|source| SemanticError::Transform { position, source })?;
        debug!(position, answer = %response.value, "model answered");

        SemanticValue::parse(&shape, response.value)
            .and_then(|value| decoder.decode(value))
            .map_err(|source| SemanticError::Evaluation { position, source })
    }
}
