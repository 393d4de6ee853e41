//! Error and retry-policy types for semantic operators.
//!
//! Three layers of failure exist:
//!
//! - [`EvaluationError`]: the model answered, but the answer does not fit the
//!   expected result shape (not a boolean, a label outside the category set, a
//!   value that does not deserialize).
//! - [`TransformError`]: anything else that went wrong while processing one
//!   item: the collaborator was unreachable, rate limited, rejected the
//!   request, or the item could not be rendered.
//! - [`SemanticError`]: what a caller of an operator sees. Per-item failures
//!   carry the original position of the item; cancellation and configuration
//!   problems are call-level.
//!
//! [`RetryPolicy`] is informational only: nothing in this crate retries. It
//! lets callers build a retry loop on top of a fresh call.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: collaborator unreachable, timeouts, rate limits,
///   server-side failures.
/// - `NonRetryable` errors: rejected requests, unparseable answers, invalid
///   configuration, cancellation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt. `None` means retry
        /// immediately or apply the caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried without changing its inputs.
    NonRetryable,
}

impl RetryPolicy {
    /// Returns `true` for [`RetryPolicy::Retryable`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

// ---------------------------------------------------------------------------
// Per-item errors
// ---------------------------------------------------------------------------

/// The model's response could not be parsed into the expected result shape.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// The answer has the wrong JSON type for the requested shape.
    #[error("expected {expected}, model answered {found}")]
    UnexpectedShape {
        /// Name of the expected shape (`"boolean"`, `"label"`).
        expected: &'static str,
        /// The answer as received, rendered as JSON.
        found: String,
    },

    /// A classification answer named a label outside the closed category set.
    #[error("label '{label}' is not one of [{permitted}]")]
    UnknownLabel {
        /// The label the model produced.
        label: String,
        /// Comma-separated list of permitted labels.
        permitted: String,
    },

    /// A transform answer could not be deserialized into the caller's type.
    #[error("value could not be decoded: {message}")]
    Undecodable {
        /// Deserializer message.
        message: String,
    },
}

/// Any non-parse failure while processing one item.
///
/// Produced by [`crate::ModelCollaborator`] implementations and by the
/// evaluator itself when an item cannot be rendered to text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The collaborator could not be reached (connection refused, DNS, timeout).
    #[error("model collaborator unreachable: {message}")]
    Unreachable {
        /// Transport error description.
        message: String,
    },

    /// The collaborator is throttling requests.
    #[error("model collaborator rate limited the request")]
    RateLimited {
        /// Delay advertised by the collaborator, if any.
        retry_after: Option<Duration>,
    },

    /// The collaborator failed on its side (HTTP 5xx or equivalent).
    #[error("model collaborator failed with status {status}: {message}")]
    ServerError {
        /// Status code reported by the collaborator.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The collaborator refused the request (HTTP 4xx other than 429).
    #[error("model collaborator rejected the request with status {status}: {message}")]
    Rejected {
        /// Status code reported by the collaborator.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The collaborator replied, but the reply carried no answer at all.
    #[error("model collaborator reply is missing an answer: {message}")]
    Protocol {
        /// What was missing.
        message: String,
    },

    /// Any other failure raised while processing the item.
    #[error("{message}")]
    Failed {
        /// Failure description.
        message: String,
    },
}

impl TransformError {
    /// Creates a [`TransformError::Failed`] from any displayable cause.
    pub fn failed(message: impl std::fmt::Display) -> Self {
        Self::Failed {
            message: message.to_string(),
        }
    }

    /// Classifies this error for caller-side retry decisions.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Unreachable { .. } | Self::ServerError { .. } => {
                RetryPolicy::Retryable { after: None }
            }
            Self::RateLimited { retry_after } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Rejected { .. } | Self::Protocol { .. } | Self::Failed { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Call-level errors
// ---------------------------------------------------------------------------

/// Outcome of a failed operator or mapper call.
///
/// A call that returns this error produced no partial results.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The model's answer for one item did not fit the expected shape.
    #[error("item {position}: {source}")]
    Evaluation {
        /// Original zero-based position of the item.
        position: usize,
        /// Parse failure.
        #[source]
        source: EvaluationError,
    },

    /// Processing one item failed for a reason other than parsing.
    #[error("item {position}: {source}")]
    Transform {
        /// Original zero-based position of the item.
        position: usize,
        /// Underlying failure.
        #[source]
        source: TransformError,
    },

    /// The cancellation signal was observed before all items completed.
    #[error("operation cancelled before all items completed")]
    Cancelled,

    /// The caller supplied an unusable argument (empty category set, zero
    /// parallelism, empty instruction).
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the problem.
        message: String,
    },

    /// More than one item failed. Failures are ordered by item position.
    #[error("{} items failed", .failures.len())]
    Aggregate {
        /// The individual per-item failures.
        failures: Vec<SemanticError>,
    },
}

impl SemanticError {
    /// Creates a [`SemanticError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` for [`SemanticError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Original position of the failing item, for per-item variants.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Evaluation { position, .. } | Self::Transform { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    /// Classifies this error for caller-side retry decisions.
    ///
    /// An aggregate is retryable only if every member is.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Transform { source, .. } => source.retry_policy(),
            Self::Aggregate { failures } => {
                let mut after: Option<Duration> = None;
                for failure in failures {
                    match failure.retry_policy() {
                        RetryPolicy::Retryable { after: Some(delay) } => {
                            after = Some(after.map_or(delay, |current| current.max(delay)));
                        }
                        RetryPolicy::Retryable { after: None } => {}
                        RetryPolicy::NonRetryable => return RetryPolicy::NonRetryable,
                    }
                }
                RetryPolicy::Retryable { after }
            }
            Self::Evaluation { .. } | Self::Cancelled | Self::Configuration { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }

    /// Folds per-item failures into one outcome.
    ///
    /// Cancellation wins over anything else; a single failure is returned
    /// unchanged; several become an [`SemanticError::Aggregate`] sorted by
    /// position. Returns `None` when `failures` is empty.
    pub(crate) fn settle(mut failures: Vec<SemanticError>) -> Option<Self> {
        if failures.iter().any(SemanticError::is_cancelled) {
            return Some(Self::Cancelled);
        }
        match failures.len() {
            0 => None,
            1 => failures.pop(),
            _ => {
                failures.sort_by_key(|f| f.position().unwrap_or(usize::MAX));
                Some(Self::Aggregate { failures })
            }
        }
    }
}
