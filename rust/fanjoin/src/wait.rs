//! Batch join over externally-started work.
//!
//! [`wait_all`] is the join barrier and result collector applied to a set of
//! already-pending futures the caller produced on its own: no admission gate
//! is involved, so bounding the concurrency of that work is entirely the
//! caller's responsibility.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{Result, error::Error};

/// Suspends until every future in `pending` is terminal, then returns their
/// values in the same order as given.
///
/// Failures follow the engine's all-or-nothing policy: every future is
/// driven to completion, and if any failed the call surfaces one aggregate
/// carrying all of them, ordered by position.
///
/// Cancellation interrupts the *wait*, not the work: if `cancel` fires
/// before the last future resolves, the call returns a canceled error and
/// the pending futures are dropped in place, to be handled by whoever owns
/// the underlying work.
///
/// # Arguments
///
/// * `pending` - The ordered collection of pending outcomes
/// * `cancel` - Signal that abandons the wait when it fires
pub async fn wait_all<I, F, T>(pending: I, cancel: &CancellationToken) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    let joined = futures::future::join_all(pending);
    let outcomes = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(Error::canceled()),
        outcomes = joined => outcomes,
    };

    let mut values = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (position, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => values.push(value),
            Err(err) => failures.push((position, err)),
        }
    }
    if !failures.is_empty() {
        log::debug!("{} of {} awaited outcomes failed", failures.len(), values.len() + failures.len());
        return Err(Error::batch(failures));
    }
    Ok(values)
}
