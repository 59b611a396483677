//! Single-permit claim gate
//!
//! One gate sits in front of each queue. A lane holds the permit only for
//! the "wait for an item, then pop it" step, so claims on a queue happen one
//! at a time while already-claimed jobs are processed concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jobpool_core::{CancellationToken, JobResult};

use crate::parking::{Parking, PlatformParking};

/// Binary semaphore with cancellable acquisition
pub struct Gate {
    /// `true` while the permit is available
    open: AtomicBool,
    parking: PlatformParking,
    park_timeout: Duration,
}

impl Gate {
    pub fn new(park_timeout: Duration) -> Self {
        Self {
            open: AtomicBool::new(true),
            parking: PlatformParking::new(),
            park_timeout,
        }
    }

    #[inline]
    fn try_take(&self) -> bool {
        self.open
            .compare_exchange(true, false, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    /// Block until the permit is ours or `token` is cancelled
    ///
    /// The permit is returned when the guard drops.
    pub fn acquire(&self, token: &CancellationToken) -> JobResult<GatePermit<'_>> {
        loop {
            token.check()?;
            if self.try_take() {
                return Ok(GatePermit { gate: self });
            }

            let key = self.parking.prepare();
            token.check()?;
            if self.try_take() {
                return Ok(GatePermit { gate: self });
            }
            self.parking.park(key, Some(self.park_timeout));
        }
    }

    fn release(&self) {
        self.open.store(true, Ordering::Release);
        self.parking.unpark_one();
    }

    /// Wake every lane parked on this gate so it re-checks its token
    pub fn interrupt(&self) {
        self.parking.unpark_all();
    }

    /// True while nobody holds the permit
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }
}

/// RAII permit; releases the gate on drop
#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct GatePermit<'a> {
    gate: &'a Gate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
