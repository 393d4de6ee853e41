//! OpenAI-compatible model collaborator adapter.
//!
//! Implements the [`semantic::ModelCollaborator`] trait over the
//! chat-completions API. Any server speaking that protocol (OpenAI, Azure
//! OpenAI deployments, Ollama, vLLM) can back the semantic operators.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport, prompt wording, request formatting
//! and reply parsing live here. The [`semantic`] crate sees only
//! [`semantic::ModelCollaborator`].
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use llm::OpenAiCollaborator;
//! use semantic::{OperatorOptions, Semantic};
//!
//! let semantic = Semantic::new(OpenAiCollaborator::from_env()?);
//! let rideable = semantic
//!     .filter(
//!         vec!["horse", "tack", "airplane"],
//!         "you can ride on or in it",
//!         &OperatorOptions::new().with_max_parallel(8),
//!     )
//!     .await?;
//! println!("{rideable:?}");
//! # Ok(()) }
//! ```

mod client;
mod config;
mod errors;
mod prompt;
mod wire;

pub use client::OpenAiCollaborator;
pub use config::{OpenAiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT};
pub use errors::LlmConfigError;
