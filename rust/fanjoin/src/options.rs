//! Batch execution options: the concurrency limit and the cancellation signal.
//!
//! The limit is always an explicit caller choice. There is no inference of a
//! default degree of parallelism from the source or from any ambient
//! configuration: a caller that wants bounding says so through
//! [`BatchOptions::limit`], and everything else runs unbounded.

use std::num::NonZeroUsize;

use tokio_util::sync::CancellationToken;

use crate::{Result, error::Error};

/// Maximum number of operations allowed to execute their body concurrently.
///
/// `Limit` is either unbounded (the default) or a bound of at least one slot.
/// A bound of zero is rejected at construction time rather than being
/// reinterpreted, since a zero-slot batch could never make progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Limit {
    /// No bounding: every spawned work unit may execute at once.
    #[default]
    Unbounded,
    /// At most this many work unit bodies execute at any instant.
    Bounded(NonZeroUsize),
}

impl Limit {
    /// Creates an unbounded limit.
    pub fn unbounded() -> Limit {
        Limit::Unbounded
    }

    /// Creates a bound of `slots` concurrent executions.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if `slots` is zero.
    pub fn bounded(slots: usize) -> Result<Limit> {
        match NonZeroUsize::new(slots) {
            Some(slots) => Ok(Limit::Bounded(slots)),
            None => Err(Error::invalid_arg(
                "slots",
                "concurrency limit must be at least 1",
            )),
        }
    }

    /// The number of slots, or `None` when unbounded.
    pub fn slots(&self) -> Option<usize> {
        match self {
            Limit::Unbounded => None,
            Limit::Bounded(slots) => Some(slots.get()),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Limit::Unbounded)
    }
}

impl From<NonZeroUsize> for Limit {
    fn from(slots: NonZeroUsize) -> Limit {
        Limit::Bounded(slots)
    }
}

/// Options threaded through one engine invocation.
///
/// The default is an unbounded limit and a cancellation token that never
/// fires. Both fields are plain data; the same options value may be reused
/// across invocations, while the admission gate built from it is always
/// scoped to a single call.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Bound on simultaneous operation execution.
    pub limit: Limit,
    /// Signal observed by every gate acquire and handed to every operation.
    pub cancel: CancellationToken,
}

impl BatchOptions {
    pub fn new() -> BatchOptions {
        Default::default()
    }

    /// Sets the concurrency limit.
    #[must_use]
    pub fn limit(mut self, limit: Limit) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}
