//! Parallel batch combinators over eagerly-available sequences.
//!
//! This module provides functions for applying an asynchronous operation to
//! every element of an in-memory sequence with a bounded number of
//! simultaneous executions, rejoining the results in the original element
//! order before the caller proceeds.
//!
//! The module includes:
//! - [`map`] - Transform each element and collect the results
//! - [`filter`] - Keep the elements an async predicate approves
//! - [`for_each`] - Run a side-effecting action against each element
//!
//! All three spawn one work unit per element up front, bound execution
//! through a per-call admission gate, and only return once every unit has
//! reached a terminal state. A source that never ends is never done
//! spawning and the call never returns; callers bound such sources
//! upstream. See [`crate::stream`] for the same shapes over
//! incrementally-produced sources.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{Result, error::Error, gate::ConcurrencyGate, options::BatchOptions, unit};

/// Transforms each element of `source` in parallel and collects the results
/// in source order.
///
/// One work unit is spawned per element, tagged with the element's zero-based
/// position. At most `options.limit` operation bodies execute at any instant;
/// spawning itself is not limited. The call returns only once every unit has
/// finished, successfully or not.
///
/// # Arguments
///
/// * `source` - The elements to transform
/// * `options` - Concurrency limit and cancellation signal for this call
/// * `op` - The operation, invoked as `op(element, position, cancel)`
///
/// # Returns
///
/// The transformed values in source-traversal order, regardless of the order
/// in which the operations completed.
///
/// # Errors
///
/// If any operation fails, the call waits for the remaining units to finish
/// and then reports every failure as one aggregate; no partial result is
/// ever returned. If `options.cancel` fires, the call reports cancellation
/// instead.
pub async fn map<I, T, R, F, Fut>(source: I, options: &BatchOptions, op: F) -> Result<Vec<R>>
where
    I: IntoIterator<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T, usize, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let gate = ConcurrencyGate::new(options.limit);
    let op = Arc::new(op);
    let units: Vec<_> = source
        .into_iter()
        .enumerate()
        .map(|(position, element)| {
            unit::spawn_unit(
                position,
                element,
                gate.clone(),
                options.cancel.clone(),
                op.clone(),
            )
        })
        .collect();
    log::trace!("eager map spawned {} work units", units.len());
    unit::join_units(units, &options.cancel).await
}

/// Keeps the elements of `source` that `predicate` approves, preserving
/// their original relative order.
///
/// Each work unit hands the predicate its own handle to the element, which
/// is why `T: Clone`; survivors are returned from the handle the engine kept.
///
/// # Errors
///
/// Same all-or-nothing policy as [`map`].
pub async fn filter<I, T, F, Fut>(
    source: I,
    options: &BatchOptions,
    predicate: F,
) -> Result<Vec<T>>
where
    I: IntoIterator<Item = T>,
    T: Clone + Send + 'static,
    F: Fn(T, usize, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool>> + Send + 'static,
{
    let gate = ConcurrencyGate::new(options.limit);
    let predicate = Arc::new(predicate);
    let judge = Arc::new(
        move |element: T, position: usize, cancel: CancellationToken| {
            let predicate = predicate.clone();
            let probe = element.clone();
            async move {
                let keep = predicate(probe, position, cancel).await?;
                Ok::<(T, bool), Error>((element, keep))
            }
        },
    );
    let units: Vec<_> = source
        .into_iter()
        .enumerate()
        .map(|(position, element)| {
            unit::spawn_unit(
                position,
                element,
                gate.clone(),
                options.cancel.clone(),
                judge.clone(),
            )
        })
        .collect();
    log::trace!("eager filter spawned {} work units", units.len());
    Ok(sift(unit::join_units(units, &options.cancel).await?))
}

/// Runs `action` against each element of `source` in parallel, returning the
/// original elements in their original order once every action has finished.
///
/// Each work unit receives its own handle to the element (`T: Clone`);
/// callers that need the action's mutations to be visible through the
/// returned sequence use shared handle types such as `Arc<Mutex<_>>`.
///
/// # Errors
///
/// Same all-or-nothing policy as [`map`].
pub async fn for_each<I, T, F, Fut>(source: I, options: &BatchOptions, action: F) -> Result<Vec<T>>
where
    I: IntoIterator<Item = T>,
    T: Clone + Send + 'static,
    F: Fn(T, usize, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let gate = ConcurrencyGate::new(options.limit);
    let action = Arc::new(action);
    let runner = Arc::new(
        move |element: T, position: usize, cancel: CancellationToken| {
            let action = action.clone();
            let subject = element.clone();
            async move {
                action(subject, position, cancel).await?;
                Ok::<T, Error>(element)
            }
        },
    );
    let units: Vec<_> = source
        .into_iter()
        .enumerate()
        .map(|(position, element)| {
            unit::spawn_unit(
                position,
                element,
                gate.clone(),
                options.cancel.clone(),
                runner.clone(),
            )
        })
        .collect();
    log::trace!("eager for_each spawned {} work units", units.len());
    unit::join_units(units, &options.cancel).await
}

/// Drops the elements whose predicate outcome was false, keeping relative
/// order of the survivors.
pub(crate) fn sift<T>(judged: Vec<(T, bool)>) -> Vec<T> {
    judged
        .into_iter()
        .filter_map(|(element, keep)| keep.then_some(element))
        .collect()
}
