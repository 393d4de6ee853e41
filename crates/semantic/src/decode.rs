//! Decoder strategies: turn a checked [`SemanticValue`] into a typed output.
//!
//! Each operator picks its decoder at the call site. The decoder decides which
//! [`ResultShape`] is requested from the model and how the answer is typed.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::errors::{EvaluationError, SemanticError};
use crate::labels::LabelSet;
use crate::types::{Categories, ResultShape, SemanticValue};

/// Strategy for requesting and typing one kind of answer.
pub trait ResultDecoder: Send + Sync {
    /// Typed output produced per item.
    type Output;

    /// The answer shape to request from the model.
    fn shape(&self) -> ResultShape;

    /// Converts a shape-checked answer into the typed output.
    fn decode(&self, value: SemanticValue) -> Result<Self::Output, EvaluationError>;
}

fn unexpected(expected: &'static str, value: SemanticValue) -> EvaluationError {
    let found = match value {
        SemanticValue::Bool(b) => b.to_string(),
        SemanticValue::Label(label) => format!("label '{label}'"),
        SemanticValue::Value(v) => v.to_string(),
    };
    EvaluationError::UnexpectedShape { expected, found }
}

/// Boolean decisions (`filter`, `matches`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchDecoder;

impl ResultDecoder for MatchDecoder {
    type Output = bool;

    fn shape(&self) -> ResultShape {
        ResultShape::Boolean
    }

    fn decode(&self, value: SemanticValue) -> Result<bool, EvaluationError> {
        match value {
            SemanticValue::Bool(b) => Ok(b),
            other => Err(unexpected("boolean", other)),
        }
    }
}

/// Labels from a runtime category list (`classify`).
#[derive(Debug, Clone)]
pub struct CategoryDecoder {
    categories: Categories,
}

impl CategoryDecoder {
    /// Creates a decoder over `categories`.
    pub fn new(categories: Categories) -> Self {
        Self { categories }
    }
}

impl ResultDecoder for CategoryDecoder {
    type Output = String;

    fn shape(&self) -> ResultShape {
        ResultShape::Label {
            categories: self.categories.clone(),
        }
    }

    fn decode(&self, value: SemanticValue) -> Result<String, EvaluationError> {
        match value {
            SemanticValue::Label(label) => match self.categories.resolve(&label) {
                Some(canonical) => Ok(canonical.to_string()),
                None => Err(EvaluationError::UnknownLabel {
                    label,
                    permitted: self.categories.to_string(),
                }),
            },
            other => Err(unexpected("label", other)),
        }
    }
}

/// Labels from an enum (`classify_as`).
#[derive(Debug, Clone)]
pub struct LabelDecoder<E> {
    categories: Categories,
    _labels: PhantomData<fn() -> E>,
}

impl<E: LabelSet> LabelDecoder<E> {
    /// Creates a decoder over the variants of `E`.
    ///
    /// Fails with [`SemanticError::Configuration`] if `E` has no variants.
    pub fn new() -> Result<Self, SemanticError> {
        Ok(Self {
            categories: E::categories()?,
            _labels: PhantomData,
        })
    }
}

impl<E: LabelSet> ResultDecoder for LabelDecoder<E> {
    type Output = E;

    fn shape(&self) -> ResultShape {
        ResultShape::Label {
            categories: self.categories.clone(),
        }
    }

    fn decode(&self, value: SemanticValue) -> Result<E, EvaluationError> {
        match value {
            SemanticValue::Label(label) => {
                E::from_label(&label).ok_or_else(|| EvaluationError::UnknownLabel {
                    label,
                    permitted: self.categories.to_string(),
                })
            }
            other => Err(unexpected("label", other)),
        }
    }
}

/// Arbitrary values deserialized with `serde` (`select`, `transform_item`).
#[derive(Debug, Clone, Copy)]
pub struct ValueDecoder<R> {
    _output: PhantomData<fn() -> R>,
}

impl<R> ValueDecoder<R> {
    /// Creates a decoder producing `R`.
    pub fn new() -> Self {
        Self {
            _output: PhantomData,
        }
    }
}

impl<R> Default for ValueDecoder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DeserializeOwned> ResultDecoder for ValueDecoder<R> {
    type Output = R;

    fn shape(&self) -> ResultShape {
        ResultShape::Value
    }

    fn decode(&self, value: SemanticValue) -> Result<R, EvaluationError> {
        let raw = match value {
            SemanticValue::Value(v) => v,
            SemanticValue::Bool(b) => serde_json::Value::Bool(b),
            SemanticValue::Label(label) => serde_json::Value::String(label),
        };
        serde_json::from_value(raw).map_err(|e| EvaluationError::Undecodable {
            message: e.to_string(),
        })
    }
}
