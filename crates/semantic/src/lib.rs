//! Semantic collection operators backed by a language model.
//!
//! Operators such as [`Semantic::filter`] and [`Semantic::classify`] behave
//! like their ordinary iterator counterparts, except that the per-item
//! decision is delegated to a model through the [`ModelCollaborator`] port.
//! One model call is made per item; calls run concurrently, bounded by
//! [`OperatorOptions::with_max_parallel`], and results always come back in
//! input order.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies. It
//! defines *what* a model must answer; adapter crates (such as `llm`) define
//! *how* the answer is obtained.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | `IndexContext`, `Instruction`, `Categories`, `SemanticValue`, result types |
//! | [`labels`] | `LabelSet` trait and `label_set!` macro for enum classification |
//! | [`errors`] | `SemanticError`, `EvaluationError`, `TransformError`, `RetryPolicy` |
//! | [`identifiers`] | `BatchId` for tracing correlation |
//! | [`ports`] | `ModelCollaborator` port and its request/response types |
//! | [`decode`] | Decoder strategies selected by each operator |
//! | [`evaluator`] | `SemanticEvaluator`: one item, one model call |
//! | [`mapper`] | `map_parallel`: bounded, order-preserving concurrent map |
//! | [`config`] | `OperatorOptions`, `MaxParallel` and the default parallelism |
//! | [`operators`] | `Semantic` handle: `filter`, `classify`, `select`, single-item helpers |

pub mod config;
pub mod decode;
pub mod errors;
pub mod evaluator;
pub mod identifiers;
pub mod labels;
pub mod mapper;
pub mod operators;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{MaxParallel, OperatorOptions, PARALLEL_CALLS_PER_CPU};
pub use decode::{CategoryDecoder, LabelDecoder, MatchDecoder, ResultDecoder, ValueDecoder};
pub use errors::{EvaluationError, RetryPolicy, SemanticError, TransformError};
pub use evaluator::{item_text, SemanticEvaluator};
pub use identifiers::BatchId;
pub use labels::LabelSet;
pub use mapper::map_parallel;
pub use operators::Semantic;
pub use ports::{ModelCollaborator, ModelRequest, ModelResponse};
pub use types::{
    Categories, ClassifiedItem, IndexContext, Instruction, ResultShape, SemanticResult,
    SemanticValue,
};

// Callers need the token type to cancel operator calls.
pub use tokio_util::sync::CancellationToken;
