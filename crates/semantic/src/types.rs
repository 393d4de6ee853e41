//! Value types shared by the evaluator, the mapper and the operators.
//!
//! Unlike plain strings and integers, these types carry invariants: an
//! [`IndexContext`] always points inside its sequence, an [`Instruction`] is
//! never empty, and a [`Categories`] set is never empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EvaluationError, SemanticError};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Position of an item within the sequence being processed.
///
/// Attached to model requests so that instructions referring to position
/// ("the first or last item", "an even index") can be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawIndexContext")]
pub struct IndexContext {
    index: usize,
    count: usize,
}

#[derive(Deserialize)]
struct RawIndexContext {
    index: usize,
    count: usize,
}

impl TryFrom<RawIndexContext> for IndexContext {
    type Error = String;

    fn try_from(raw: RawIndexContext) -> Result<Self, Self::Error> {
        Self::new(raw.index, raw.count).ok_or_else(|| {
            format!(
                "index {} is outside a sequence of {} items",
                raw.index, raw.count
            )
        })
    }
}

impl IndexContext {
    /// Creates an [`IndexContext`], returning `None` unless `index < count`
    /// (which also rules out `count == 0`).
    #[must_use]
    pub fn new(index: usize, count: usize) -> Option<Self> {
        if index < count {
            Some(Self { index, count })
        } else {
            None
        }
    }

    /// Context for a lone item: index 0 of 1.
    pub fn single() -> Self {
        Self { index: 0, count: 1 }
    }

    /// Zero-based position.
    pub fn index(self) -> usize {
        self.index
    }

    /// Total number of items in the sequence.
    pub fn count(self) -> usize {
        self.count
    }

    /// Returns `true` for the item at position 0.
    pub fn is_first(self) -> bool {
        self.index == 0
    }

    /// Returns `true` for the item at position `count - 1`.
    pub fn is_last(self) -> bool {
        self.index + 1 == self.count
    }
}

impl std::fmt::Display for IndexContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

// ---------------------------------------------------------------------------
// Instruction
// ---------------------------------------------------------------------------

/// Natural-language description of the test, classification goal or
/// transform to apply to each item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instruction(String);

impl Instruction {
    /// Creates an [`Instruction`], returning `None` if the text is blank.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            None
        } else {
            Some(Self(text))
        }
    }

    /// Like [`Instruction::new`], but reports a blank instruction as a
    /// configuration error.
    pub fn required(text: impl Into<String>) -> Result<Self, SemanticError> {
        Self::new(text).ok_or_else(|| SemanticError::configuration("instruction must not be empty"))
    }

    /// Returns the instruction text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Instruction {
    type Error = SemanticError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::required(text)
    }
}

impl From<Instruction> for String {
    fn from(instruction: Instruction) -> Self {
        instruction.0
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Label equality: surrounding whitespace ignored, Unicode case folded.
pub(crate) fn same_label(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Closed, ordered, non-empty set of classification labels.
///
/// Labels are compared case-insensitively (full Unicode lowercase) after
/// trimming; the spelling given
/// at construction is the canonical one returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Categories(Vec<String>);

impl Categories {
    /// Builds a category set from labels.
    ///
    /// Blank labels and case-insensitive duplicates are dropped. An empty
    /// result is a [`SemanticError::Configuration`]: there is no sensible
    /// default category to fall back on.
    pub fn new<I, S>(labels: I) -> Result<Self, SemanticError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into().trim().to_string();
            if label.is_empty() || set.iter().any(|l| same_label(l, &label)) {
                continue;
            }
            set.push(label);
        }
        if set.is_empty() {
            return Err(SemanticError::configuration(
                "classification requires at least one category",
            ));
        }
        Ok(Self(set))
    }

    /// Returns the canonical spelling of `label` if it belongs to the set.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|c| same_label(c, label))
            .map(String::as_str)
    }

    /// Returns `true` if `label` belongs to the set.
    pub fn contains(&self, label: &str) -> bool {
        self.resolve(label).is_some()
    }

    /// Labels in declaration order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of labels (always at least one).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<String>> for Categories {
    type Error = SemanticError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(labels)
    }
}

impl From<Categories> for Vec<String> {
    fn from(categories: Categories) -> Self {
        categories.0
    }
}

impl std::fmt::Display for Categories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Shape of answer the evaluator asks the model for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ResultShape {
    /// A yes/no decision.
    Boolean,
    /// One label out of a closed set.
    Label {
        /// The permitted labels.
        categories: Categories,
    },
    /// An arbitrary JSON value.
    Value,
}

impl ResultShape {
    fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Label { .. } => "label",
            Self::Value => "value",
        }
    }
}

/// A model answer checked against its [`ResultShape`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum SemanticValue {
    /// Answer to a match.
    Bool(bool),
    /// Canonical label from the requested category set.
    Label(String),
    /// Free-form transformed value.
    Value(Value),
}

impl SemanticValue {
    /// Checks a raw answer against `shape`.
    ///
    /// Booleans must be JSON booleans and labels must be JSON strings that
    /// resolve inside the category set. Nothing is coerced.
    pub fn parse(shape: &ResultShape, raw: Value) -> Result<Self, EvaluationError> {
        match (shape, raw) {
            (ResultShape::Boolean, Value::Bool(b)) => Ok(Self::Bool(b)),
            (ResultShape::Label { categories }, Value::String(label)) => categories
                .resolve(&label)
                .map(|canonical| Self::Label(canonical.to_string()))
                .ok_or_else(|| EvaluationError::UnknownLabel {
                    label,
                    permitted: categories.to_string(),
                }),
            (ResultShape::Value, value) => Ok(Self::Value(value)),
            (shape, other) => Err(EvaluationError::UnexpectedShape {
                expected: shape.name(),
                found: other.to_string(),
            }),
        }
    }
}

/// Evaluator output for one item, tagged with the item's original position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticResult<R> {
    /// Zero-based position of the originating item.
    pub position: usize,
    /// Decoded answer.
    pub value: R,
}

/// An item paired with the category it was classified into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedItem<T, C> {
    /// The original item.
    pub item: T,
    /// The category chosen for it.
    pub category: C,
}
