//! The admission gate bounding simultaneous operation execution.
//!
//! A [`ConcurrencyGate`] is created fresh for one engine invocation, sized
//! from the caller's [`Limit`], and discarded once every work unit has been
//! joined. Work units are spawned without limit; only execution of the
//! operation body is gated, by acquiring a [`SlotPermit`] first.
//!
//! Slots are released through `Drop`, so a unit that fails or is canceled
//! after admission still returns its slot on every exit path. When the limit
//! is unbounded the gate holds no semaphore at all and admission is an
//! immediate no-op.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::{Result, error::Error, options::Limit};

/// Counting limiter for concurrent operation bodies.
///
/// Clones share the same slot pool, which is how every work unit of one
/// invocation observes a single bound.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    slots: Option<Arc<Semaphore>>,
}

impl ConcurrencyGate {
    /// Creates a gate for one engine invocation.
    pub fn new(limit: Limit) -> ConcurrencyGate {
        let slots = limit
            .slots()
            .map(|slots| Arc::new(Semaphore::new(slots.min(Semaphore::MAX_PERMITS))));
        ConcurrencyGate { slots }
    }

    /// Suspends until a slot is available or `cancel` fires.
    ///
    /// Cancellation is checked first, so a fired token makes a pending
    /// acquire fail fast instead of queueing behind busy slots. The
    /// unbounded fast path never suspends but still observes a token that
    /// has already fired.
    ///
    /// # Errors
    ///
    /// Returns a canceled error if the signal fires before a slot is granted.
    pub async fn admit(&self, cancel: &CancellationToken) -> Result<SlotPermit> {
        let Some(slots) = &self.slots else {
            if cancel.is_cancelled() {
                return Err(Error::canceled());
            }
            return Ok(SlotPermit { permit: None });
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::canceled()),
            permit = slots.clone().acquire_owned() => {
                let permit = permit.expect("gate semaphore is never closed");
                Ok(SlotPermit { permit: Some(permit) })
            }
        }
    }

    /// Slots not currently held, or `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        self.slots.as_ref().map(|slots| slots.available_permits())
    }
}

/// One granted execution slot. Dropping it returns the slot to the gate.
#[derive(Debug)]
pub struct SlotPermit {
    permit: Option<OwnedSemaphorePermit>,
}

impl SlotPermit {
    /// Whether this permit occupies a real slot (`false` for the unbounded
    /// fast path).
    pub fn is_bounded(&self) -> bool {
        self.permit.is_some()
    }
}
