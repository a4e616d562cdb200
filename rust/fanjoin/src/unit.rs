//! Work unit internals: spawn one task per source element, then join them
//! all in spawn order.

use std::future::Future;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{Result, error::Error, gate::ConcurrencyGate};

/// Terminal outcome of one work unit, tagged with its spawn position.
pub(crate) struct UnitOutcome<O> {
    pub position: usize,
    pub outcome: Result<O>,
}

/// Schedules one execution of `op` against `element`.
///
/// The task acquires a gate slot before invoking the operation body and
/// holds it for the duration of the call; the slot is returned on every
/// exit path, including operation failure and cancellation.
pub(crate) fn spawn_unit<T, O, F, Fut>(
    position: usize,
    element: T,
    gate: ConcurrencyGate,
    cancel: CancellationToken,
    op: Arc<F>,
) -> JoinHandle<UnitOutcome<O>>
where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T, usize, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O>> + Send + 'static,
{
    tokio::spawn(async move {
        let outcome = execute(position, element, gate, cancel, op).await;
        UnitOutcome { position, outcome }
    })
}

async fn execute<T, O, F, Fut>(
    position: usize,
    element: T,
    gate: ConcurrencyGate,
    cancel: CancellationToken,
    op: Arc<F>,
) -> Result<O>
where
    F: Fn(T, usize, CancellationToken) -> Fut,
    Fut: Future<Output = Result<O>>,
{
    let _slot = gate.admit(&cancel).await?;
    op(element, position, cancel.clone()).await
}

/// The join barrier: waits for every spawned unit to reach a terminal state,
/// then folds the outcomes into an ordered result.
///
/// Handles are awaited in spawn order, which is also position order, so the
/// collected values come out in source-traversal order with no re-sorting.
/// No failure is surfaced before every unit is terminal:
///
/// - a panicked unit is re-raised (lowest position first) after the drain;
/// - if the cancellation signal fired, the whole batch reports canceled;
/// - otherwise unit failures surface as one aggregate carrying all of them.
pub(crate) async fn join_units<O>(
    units: Vec<JoinHandle<UnitOutcome<O>>>,
    cancel: &CancellationToken,
) -> Result<Vec<O>> {
    let total = units.len();
    log::trace!("joining {total} work units");

    let mut outcomes: Vec<(usize, Result<O>)> = Vec::with_capacity(total);
    let mut panics = Vec::new();
    for (position, unit) in units.into_iter().enumerate() {
        match unit.await {
            Ok(unit_outcome) => outcomes.push((unit_outcome.position, unit_outcome.outcome)),
            Err(join_err) if join_err.is_panic() => {
                panics.push((position, join_err.into_panic()));
            }
            Err(_) => outcomes.push((position, Err(Error::canceled()))),
        }
    }

    if let Some((position, payload)) = panics.into_iter().next() {
        log::debug!("work unit at position {position} panicked; re-raising after drain");
        std::panic::resume_unwind(payload);
    }
    if cancel.is_cancelled() {
        log::debug!("batch of {total} units canceled");
        return Err(Error::canceled());
    }

    let mut values = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (position, outcome) in outcomes {
        match outcome {
            Ok(value) => values.push(value),
            Err(err) => failures.push((position, err)),
        }
    }
    if !failures.is_empty() {
        log::debug!("{} of {total} work units failed", failures.len());
        return Err(Error::batch(failures));
    }
    Ok(values)
}
