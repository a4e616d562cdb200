//! Occupancy probe for observing how many operations run at once.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Counts concurrent occupants and records the observed peak.
///
/// An operation under test calls [`enter`](Self::enter) when its body starts
/// and drops the returned guard when it finishes; the probe tracks the
/// instantaneous occupancy and the maximum ever observed. Cloning the probe
/// shares the underlying counters.
#[derive(Debug, Clone, Default)]
pub struct ConcurrencyProbe {
    state: Arc<ProbeState>,
}

#[derive(Debug, Default)]
struct ProbeState {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl ConcurrencyProbe {
    pub fn new() -> ConcurrencyProbe {
        Default::default()
    }

    /// Registers one occupant until the returned guard is dropped.
    pub fn enter(&self) -> ProbeGuard {
        let occupancy = self.state.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.peak.fetch_max(occupancy, Ordering::SeqCst);
        ProbeGuard {
            state: self.state.clone(),
        }
    }

    /// Occupancy right now.
    pub fn current(&self) -> usize {
        self.state.current.load(Ordering::SeqCst)
    }

    /// Highest occupancy observed so far.
    pub fn peak(&self) -> usize {
        self.state.peak.load(Ordering::SeqCst)
    }
}

/// Active occupancy registration; decrements the count on drop.
#[derive(Debug)]
pub struct ProbeGuard {
    state: Arc<ProbeState>,
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        self.state.current.fetch_sub(1, Ordering::SeqCst);
    }
}
