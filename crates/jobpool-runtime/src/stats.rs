//! Pool counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, bumped by lanes with relaxed ordering
#[derive(Default)]
pub(crate) struct Counters {
    pub submitted: AtomicU64,
    pub reads: AtomicU64,
    pub writes: AtomicU64,
    pub forwarded: AtomicU64,
    pub dropped: AtomicU64,
    pub faults: AtomicU64,
}

impl Counters {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a pool's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs handed to `submit`
    pub submitted: u64,
    /// `on_read` calls
    pub reads: u64,
    /// `on_write` calls
    pub writes: u64,
    /// Jobs moved to the opposite queue
    pub forwarded: u64,
    /// Jobs taken out of circulation (completed, closed or faulted)
    pub dropped: u64,
    /// Handler errors and caught panics
    pub faults: u64,
}

impl PoolStats {
    /// Jobs submitted but not yet dropped
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.dropped)
    }
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "submitted={} reads={} writes={} forwarded={} dropped={} faults={}",
            self.submitted, self.reads, self.writes, self.forwarded, self.dropped, self.faults
        )
    }
}
