//! Bounded parallel mapper.
//!
//! [`map_parallel`] applies an async transform to every item of a sequence
//! with at most `max_parallel` transforms in flight, and returns the outputs in
//! input order.
//!
//! ## Scheduling
//!
//! Items are enumerated once. Positions are dispatched in input order into a
//! [`FuturesUnordered`] set of slots; whenever a slot settles its result is
//! written to that position of a pre-sized buffer and the next position is
//! dispatched. Nothing is spawned: all slots are polled by the caller's
//! future, so transforms may borrow from the caller.
//!
//! ## Failure and cancellation
//!
//! - After the first failure no further positions are dispatched, but slots
//!   already in flight are allowed to settle. One failure is returned as-is;
//!   several are returned as [`SemanticError::Aggregate`].
//! - Once the cancellation token fires nothing further is dispatched. In-flight
//!   transforms receive the same token and are expected to stop; the call
//!   waits for them and then fails with [`SemanticError::Cancelled`].
//! - Cancellation takes precedence over other failures. Partial results are
//!   never returned.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::MaxParallel;
use crate::errors::SemanticError;
use crate::types::IndexContext;

/// Maps `items` through `transform` with bounded concurrency.
///
/// `transform` receives the item, its [`IndexContext`] and a clone of
/// `cancel`. `output[i]` is always the result for `items[i]`, whatever order
/// the transforms complete in.
///
/// An empty input yields an empty output without calling `transform`.
pub async fn map_parallel<I, T, R, F, Fut>(
    items: I,
    max_parallel: MaxParallel,
    cancel: &CancellationToken,
    mut transform: F,
) -> Result<Vec<R>, SemanticError>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: ExactSizeIterator,
    F: FnMut(T, IndexContext, CancellationToken) -> Fut,
    Fut: Future<Output = Result<R, SemanticError>>,
{
    let mut queue = items.into_iter().enumerate();
    let count = queue.len();
    if count == 0 {
        return Ok(Vec::new());
    }

    let limit = max_parallel.get();
    let mut results: Vec<Option<R>> = std::iter::repeat_with(|| None).take(count).collect();
    let mut failures: Vec<SemanticError> = Vec::new();
    let mut slots = FuturesUnordered::new();

    loop {
        while slots.len() < limit && failures.is_empty() && !cancel.is_cancelled() {
            let Some((position, item)) = queue.next() else {
                break;
            };
            let context = IndexContext::new(position, count).ok_or_else(|| {
                SemanticError::configuration(format!(
                    "sequence yielded more items than its reported length {count}"
                ))
            })?;
            debug!(position, in_flight = slots.len() + 1, "dispatching transform");
            let slot = transform(item, context, cancel.clone());
            slots.push(async move { (position, slot.await) });
        }

        let Some((position, outcome)) = slots.next().await else {
            break;
        };
        match outcome {
            Ok(value) => {
                debug!(position, "transform completed");
                results[position] = Some(value);
            }
            Err(error) => {
                warn!(position, error = %error, "transform failed");
                failures.push(error);
            }
        }
    }

    let complete = results.iter().all(Option::is_some);
    if cancel.is_cancelled() && !complete {
        warn!(count, "mapper cancelled before all items completed");
        return Err(SemanticError::Cancelled);
    }
    if let Some(error) = SemanticError::settle(failures) {
        return Err(error);
    }

    results.into_iter().collect::<Option<Vec<R>>>().ok_or_else(|| {
        SemanticError::configuration(format!(
            "sequence yielded fewer items than its reported length {count}"
        ))
    })
}
