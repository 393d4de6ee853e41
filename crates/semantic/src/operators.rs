//! Collection operators and single-item helpers.
//!
//! Every collection operator is [`map_parallel`] over the
//! [`SemanticEvaluator`] with a decoder picked for the operator, followed by a
//! filter or pairing step. Collection calls always send index context, so
//! instructions may refer to position.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, info_span, Instrument};

use crate::config::OperatorOptions;
use crate::decode::{CategoryDecoder, LabelDecoder, MatchDecoder, ResultDecoder, ValueDecoder};
use crate::errors::SemanticError;
use crate::evaluator::SemanticEvaluator;
use crate::identifiers::BatchId;
use crate::labels::LabelSet;
use crate::mapper::map_parallel;
use crate::ports::ModelCollaborator;
use crate::types::{Categories, ClassifiedItem, Instruction};

/// Instruction used by `classify` when the caller supplies none.
const DEFAULT_CLASSIFY_INSTRUCTION: &str = "Choose the category that best describes the item.";

/// Handle exposing semantic operators over one model collaborator.
///
/// ```no_run
/// # async fn demo<M: semantic::ModelCollaborator>(model: M) -> Result<(), semantic::SemanticError> {
/// use semantic::{OperatorOptions, Semantic};
///
/// let semantic = Semantic::new(model);
/// let rideable = semantic
///     .filter(
///         vec!["horse", "tack", "airplane"],
///         "you can ride on or in it",
///         &OperatorOptions::new(),
///     )
///     .await?;
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct Semantic<M> {
    evaluator: SemanticEvaluator<M>,
}

impl<M: ModelCollaborator> Semantic<M> {
    /// Creates a handle backed by `model`.
    pub fn new(model: M) -> Self {
        Self {
            evaluator: SemanticEvaluator::new(model),
        }
    }

    /// The evaluator behind the operators.
    pub fn evaluator(&self) -> &SemanticEvaluator<M> {
        &self.evaluator
    }

    // -----------------------------------------------------------------------
    // Collection operators
    // -----------------------------------------------------------------------

    /// Keeps the items for which `instruction` holds, in original order.
    #[doc(alias = "where")]
    pub async fn filter<T>(
        &self,
        items: Vec<T>,
        instruction: &str,
        options: &OperatorOptions,
    ) -> Result<Vec<T>, SemanticError>
    where
        T: Serialize,
    {
        let instruction = Instruction::required(instruction)?;
        let count = items.len();
        let decisions = self
            .evaluate_all(items, &instruction, &MatchDecoder, options)
            .instrument(batch_span("filter", count))
            .await?;
        let kept: Vec<T> = decisions
            .into_iter()
            .filter_map(|(item, keep)| keep.then_some(item))
            .collect();
        info!(items = count, kept = kept.len(), "filter finished");
        Ok(kept)
    }

    /// Pairs every item with one label from `categories`, in original order.
    ///
    /// `instruction` refines how to choose; without it the model is asked for
    /// the best-fitting category.
    pub async fn classify<T>(
        &self,
        items: Vec<T>,
        categories: &Categories,
        instruction: Option<&str>,
        options: &OperatorOptions,
    ) -> Result<Vec<ClassifiedItem<T, String>>, SemanticError>
    where
        T: Serialize,
    {
        let instruction = classify_instruction(instruction)?;
        let decoder = CategoryDecoder::new(categories.clone());
        let count = items.len();
        let labelled = self
            .evaluate_all(items, &instruction, &decoder, options)
            .instrument(batch_span("classify", count))
            .await?;
        Ok(labelled
            .into_iter()
            .map(|(item, category)| ClassifiedItem { item, category })
            .collect())
    }

    /// Pairs every item with a variant of `E`, in original order.
    pub async fn classify_as<T, E>(
        &self,
        items: Vec<T>,
        instruction: Option<&str>,
        options: &OperatorOptions,
    ) -> Result<Vec<ClassifiedItem<T, E>>, SemanticError>
    where
        T: Serialize,
        E: LabelSet,
    {
        let instruction = classify_instruction(instruction)?;
        let decoder = LabelDecoder::<E>::new()?;
        let count = items.len();
        let labelled = self
            .evaluate_all(items, &instruction, &decoder, options)
            .instrument(batch_span("classify_as", count))
            .await?;
        Ok(labelled
            .into_iter()
            .map(|(item, category)| ClassifiedItem { item, category })
            .collect())
    }

    /// Transforms every item according to `goal`, in original order.
    ///
    /// The model's answer for each item is deserialized into `R`.
    pub async fn select<T, R>(
        &self,
        items: Vec<T>,
        goal: &str,
        options: &OperatorOptions,
    ) -> Result<Vec<R>, SemanticError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let instruction = Instruction::required(goal)?;
        let decoder = ValueDecoder::<R>::new();
        let count = items.len();
        let transformed = self
            .evaluate_all(items, &instruction, &decoder, options)
            .instrument(batch_span("select", count))
            .await?;
        Ok(transformed.into_iter().map(|(_, value)| value).collect())
    }

    // -----------------------------------------------------------------------
    // Single-item helpers
    // -----------------------------------------------------------------------

    /// Returns whether `instruction` holds for `item`.
    pub async fn matches<T>(
        &self,
        item: &T,
        instruction: &str,
        options: &OperatorOptions,
    ) -> Result<bool, SemanticError>
    where
        T: Serialize + ?Sized,
    {
        let instruction = Instruction::required(instruction)?;
        self.evaluator
            .evaluate_single(item, &instruction, &MatchDecoder, options.cancellation())
            .await
    }

    /// Returns the label from `categories` that best matches `item`.
    pub async fn classify_item<T>(
        &self,
        item: &T,
        categories: &Categories,
        instruction: Option<&str>,
        options: &OperatorOptions,
    ) -> Result<String, SemanticError>
    where
        T: Serialize + ?Sized,
    {
        let instruction = classify_instruction(instruction)?;
        let decoder = CategoryDecoder::new(categories.clone());
        self.evaluator
            .evaluate_single(item, &instruction, &decoder, options.cancellation())
            .await
    }

    /// Returns the variant of `E` that best matches `item`.
    pub async fn classify_item_as<T, E>(
        &self,
        item: &T,
        instruction: Option<&str>,
        options: &OperatorOptions,
    ) -> Result<E, SemanticError>
    where
        T: Serialize + ?Sized,
        E: LabelSet,
    {
        let instruction = classify_instruction(instruction)?;
        let decoder = LabelDecoder::<E>::new()?;
        self.evaluator
            .evaluate_single(item, &instruction, &decoder, options.cancellation())
            .await
    }

    /// Transforms `item` according to `goal` and deserializes the answer.
    pub async fn transform_item<T, R>(
        &self,
        item: &T,
        goal: &str,
        options: &OperatorOptions,
    ) -> Result<R, SemanticError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let instruction = Instruction::required(goal)?;
        self.evaluator
            .evaluate_single(item, &instruction, &ValueDecoder::<R>::new(), options.cancellation())
            .await
    }

    // -----------------------------------------------------------------------

    /// Runs the evaluator over `items` and pairs each item with its answer.
    async fn evaluate_all<T, D>(
        &self,
        items: Vec<T>,
        instruction: &Instruction,
        decoder: &D,
        options: &OperatorOptions,
    ) -> Result<Vec<(T, D::Output)>, SemanticError>
    where
        T: Serialize,
        D: ResultDecoder,
    {
        let max_parallel = options.max_parallel()?;
        let evaluator = &self.evaluator;
        map_parallel(
            items,
            max_parallel,
            options.cancellation(),
            |item, index, cancel| async move {
                let result = evaluator
                    .evaluate(&item, index, instruction, decoder, &cancel)
                    .await?;
                Ok((item, result.value))
            },
        )
        .await
    }
}

fn classify_instruction(instruction: Option<&str>) -> Result<Instruction, SemanticError> {
    match instruction {
        Some(text) => Instruction::required(text),
        None => Instruction::required(DEFAULT_CLASSIFY_INSTRUCTION),
    }
}

fn batch_span(operator: &'static str, items: usize) -> tracing::Span {
    info_span!("semantic_batch", batch_id = %BatchId::new_random(), operator, items)
}
