//! Parallel batch combinators over incrementally-produced sequences.
//!
//! The same three shapes as [`crate::batch`], taking a [`Stream`] whose
//! elements may each require suspension to obtain. Pulling the source and
//! executing already-spawned work interleave: each element is turned into a
//! scheduled work unit the moment it becomes available, without waiting for
//! earlier units to finish, and the join barrier is entered once the source
//! reports exhaustion.
//!
//! Two properties worth knowing before reaching for these:
//!
//! - Spawn-ahead is unbounded. Execution is gated by the concurrency limit,
//!   but every element pulled so far has a live work unit, so memory grows
//!   with source length. A caller draining an unbounded source must apply a
//!   limit upstream or the call never returns.
//! - If the cancellation signal fires while the source is still producing,
//!   the engine stops pulling further elements; units spawned up to that
//!   point are still driven to a terminal state before the call reports
//!   cancellation.

use std::future::Future;
use std::sync::Arc;

use futures::{Stream, StreamExt, pin_mut};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    Result,
    error::Error,
    gate::ConcurrencyGate,
    options::BatchOptions,
    unit::{self, UnitOutcome},
};

/// Transforms each element of a streamed `source` in parallel, collecting
/// the results in source order.
///
/// Positions are assigned in the order elements are pulled from the source,
/// and the output sequence follows that order regardless of completion
/// order. The call returns only once the source is exhausted and every
/// spawned unit has reached a terminal state.
///
/// # Errors
///
/// Same all-or-nothing policy as [`crate::batch::map`].
pub async fn map<S, T, R, F, Fut>(source: S, options: &BatchOptions, op: F) -> Result<Vec<R>>
where
    S: Stream<Item = T>,
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T, usize, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let gate = ConcurrencyGate::new(options.limit);
    let units = spawn_from_source(source, &gate, &options.cancel, Arc::new(op)).await;
    log::trace!("streaming map spawned {} work units", units.len());
    unit::join_units(units, &options.cancel).await
}

/// Keeps the elements of a streamed `source` that `predicate` approves,
/// preserving the order in which the source produced them.
pub async fn filter<S, T, F, Fut>(source: S, options: &BatchOptions, predicate: F) -> Result<Vec<T>>
where
    S: Stream<Item = T>,
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
    let units = spawn_from_source(source, &gate, &options.cancel, judge).await;
    log::trace!("streaming filter spawned {} work units", units.len());
    Ok(crate::batch::sift(
        unit::join_units(units, &options.cancel).await?,
    ))
}

/// Runs `action` against each element of a streamed `source`, returning the
/// elements in production order once every action has finished.
pub async fn for_each<S, T, F, Fut>(source: S, options: &BatchOptions, action: F) -> Result<Vec<T>>
where
    S: Stream<Item = T>,
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
    let units = spawn_from_source(source, &gate, &options.cancel, runner).await;
    log::trace!("streaming for_each spawned {} work units", units.len());
    unit::join_units(units, &options.cancel).await
}

/// Drains the source, spawning one work unit per element as it arrives.
///
/// Pulling stops at source exhaustion or when `cancel` fires, whichever
/// comes first.
async fn spawn_from_source<S, T, O, F, Fut>(
    source: S,
    gate: &ConcurrencyGate,
    cancel: &CancellationToken,
    op: Arc<F>,
) -> Vec<JoinHandle<UnitOutcome<O>>>
where
    S: Stream<Item = T>,
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T, usize, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O>> + Send + 'static,
{
    pin_mut!(source);
    let mut units = Vec::new();
    loop {
        let element = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            element = source.next() => element,
        };
        let Some(element) = element else { break };
        units.push(unit::spawn_unit(
            units.len(),
            element,
            gate.clone(),
            cancel.clone(),
            op.clone(),
        ));
    }
    units
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use fanjoin_testkit::{latency, probe::ConcurrencyProbe};
    use tokio::time::{Duration, Instant, sleep};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::options::Limit;

    /// A source whose every element takes a little while to become
    /// available.
    fn trickle(count: usize) -> impl Stream<Item = usize> {
        futures::stream::iter(0..count).then(|element| async move {
            sleep(Duration::from_millis(1)).await;
            element
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_map_preserves_source_order() {
        let count = 12;
        let options = BatchOptions::new().limit(Limit::bounded(3).unwrap());
        let result = map(
            trickle(count),
            &options,
            move |element, position, _cancel| async move {
                sleep(latency::inverse_delay(
                    position,
                    count,
                    Duration::from_millis(4),
                ))
                .await;
                Ok(element * 2)
            },
        )
        .await
        .unwrap();
        let expected: Vec<_> = (0..count).map(|element| element * 2).collect();
        assert_eq!(result, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_filter_keeps_even_numbers() {
        let options = BatchOptions::new().limit(Limit::bounded(4).unwrap());
        let result = filter(
            trickle(20),
            &options,
            |element, _position, _cancel| async move { Ok(element % 2 == 0) },
        )
        .await
        .unwrap();
        assert_eq!(result, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_for_each_mutations_visible() {
        let elements: Vec<_> = (0..6u64).map(|value| Arc::new(Mutex::new(value))).collect();
        let options = BatchOptions::new().limit(Limit::bounded(2).unwrap());
        let result = for_each(
            futures::stream::iter(elements.clone()),
            &options,
            |element: Arc<Mutex<u64>>, _position, _cancel| async move {
                *element.lock().unwrap() *= 2;
                Ok(())
            },
        )
        .await
        .unwrap();

        for (position, (returned, original)) in result.iter().zip(elements.iter()).enumerate() {
            assert!(Arc::ptr_eq(returned, original));
            assert_eq!(*returned.lock().unwrap(), position as u64 * 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_spawning_interleaves_with_execution() {
        let count = 12;
        let probe = ConcurrencyProbe::new();
        let options = BatchOptions::new();
        let observer = probe.clone();
        let start = Instant::now();
        map(trickle(count), &options, move |element, _position, _cancel| {
            let probe = observer.clone();
            async move {
                let _guard = probe.enter();
                sleep(Duration::from_millis(50)).await;
                Ok(element)
            }
        })
        .await
        .unwrap();

        // Every unit overlapped with the still-draining source: total time
        // is one sleep plus the trickle, nowhere near count * 50ms.
        assert!(start.elapsed() < Duration::from_millis(100));
        assert_eq!(probe.peak(), count);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_cancellation_stops_pulling() {
        let token = CancellationToken::new();
        let pulled = Arc::new(AtomicUsize::new(0));
        let source = {
            let pulled = pulled.clone();
            futures::stream::unfold(0usize, move |next| {
                let pulled = pulled.clone();
                async move {
                    sleep(Duration::from_millis(1)).await;
                    pulled.fetch_add(1, Ordering::SeqCst);
                    Some((next, next + 1))
                }
            })
        };
        let trigger = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let options = BatchOptions::new().cancel(token);
        let err = map(source, &options, |element: usize, _position, _cancel| {
            async move {
                sleep(Duration::from_millis(100)).await;
                Ok(element)
            }
        })
        .await
        .unwrap_err();

        assert!(err.is_canceled());
        // The infinite source stopped being drained shortly after the
        // signal fired.
        assert!(pulled.load(Ordering::SeqCst) < 50);
    }
}
