//! Adapter construction errors.
//!
//! Per-request failures are reported as [`semantic::TransformError`]; this
//! module only covers problems that prevent the adapter from being built.

use thiserror::Error;

/// The adapter could not be configured.
#[derive(Debug, Error)]
pub enum LlmConfigError {
    /// A required environment variable is unset or empty.
    #[error("environment variable {name} is not set")]
    MissingVariable {
        /// Variable name.
        name: &'static str,
    },

    /// An environment variable holds an unusable value.
    #[error("environment variable {name} is invalid: {message}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Parse failure.
        message: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client could not be built: {message}")]
    Client {
        /// Builder error.
        message: String,
    },
}
