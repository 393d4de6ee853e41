//! Per-call configuration: parallelism and cancellation.
//!
//! The default parallelism is derived from the host when a call starts. It is
//! not cached in process-wide state, so two calls may resolve different
//! defaults if the available parallelism changes in between.

use std::num::NonZeroUsize;

use tokio_util::sync::CancellationToken;

use crate::errors::SemanticError;

/// Model calls kept in flight per available CPU when the caller sets no limit.
pub const PARALLEL_CALLS_PER_CPU: usize = 2;

/// Upper bound on concurrently running transforms. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaxParallel(NonZeroUsize);

impl MaxParallel {
    /// Creates a [`MaxParallel`], returning `None` for zero.
    #[must_use]
    pub fn new(limit: usize) -> Option<Self> {
        NonZeroUsize::new(limit).map(Self)
    }

    /// `PARALLEL_CALLS_PER_CPU` times the host's available parallelism.
    ///
    /// Falls back to a single CPU if the host cannot report it.
    pub fn host_default() -> Self {
        let cpus = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let limit = cpus.saturating_mul(PARALLEL_CALLS_PER_CPU).max(1);
        Self(NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN))
    }

    /// Returns the limit.
    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl std::fmt::Display for MaxParallel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Options accepted by every operator.
///
/// ```
/// use semantic::OperatorOptions;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let options = OperatorOptions::new()
///     .with_max_parallel(4)
///     .with_cancellation(token.clone());
/// assert_eq!(options.max_parallel().unwrap().get(), 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OperatorOptions {
    max_parallel: Option<usize>,
    cancel: CancellationToken,
}

impl OperatorOptions {
    /// Options with host-default parallelism and a token nobody cancels.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of model calls in flight.
    ///
    /// Zero is accepted here and rejected when the call starts.
    #[must_use]
    pub fn with_max_parallel(mut self, limit: usize) -> Self {
        self.max_parallel = Some(limit);
        self
    }

    /// Uses `token` as the call's cancellation signal.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The cancellation signal shared by every item of the call.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Resolves the effective parallelism.
    ///
    /// Returns [`SemanticError::Configuration`] if the caller asked for zero.
    pub fn max_parallel(&self) -> Result<MaxParallel, SemanticError> {
        match self.max_parallel {
            None => Ok(MaxParallel::host_default()),
            Some(limit) => MaxParallel::new(limit).ok_or_else(|| {
                SemanticError::configuration("max_parallel must be greater than zero")
            }),
        }
    }
}
