//! Peak resident-record tracking.
//!
//! The external sort reports how many records it holds in memory (chunk
//! buffer plus merge heads); tests use the peak to check the memory bound.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct PeakTracker {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current number of resident records; updates peak if higher.
    pub fn record_resident(&self, resident: usize) {
        self.current.store(resident, Ordering::Relaxed);
        let mut cur = self.peak.load(Ordering::Relaxed);
        while resident > cur {
            match self
                .peak
                .compare_exchange(cur, resident, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(observed) => cur = observed,
            }
        }
        #[cfg(feature = "tracing")]
        tracing::trace!(resident, peak = self.peak.load(Ordering::Relaxed), "resident records");
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.current.store(0, Ordering::Relaxed);
        self.peak.store(0, Ordering::Relaxed);
    }
}
