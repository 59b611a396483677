//! Arm latch
//!
//! Lanes are spawned when the pool is built but must not touch a queue until
//! `run()` arms the pool. They park here instead of polling a pause flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use jobpool_core::{CancellationToken, JobResult};

use crate::parking::{Parking, PlatformParking};

/// One-shot latch: closed at construction, opened once by [`arm`](Self::arm)
pub struct ArmLatch {
    armed: AtomicBool,
    parking: PlatformParking,
    park_timeout: Duration,
}

impl ArmLatch {
    pub fn new(park_timeout: Duration) -> Self {
        Self {
            armed: AtomicBool::new(false),
            parking: PlatformParking::new(),
            park_timeout,
        }
    }

    /// Open the latch and release every waiting lane
    ///
    /// Returns `false` if it was already armed.
    pub fn arm(&self) -> bool {
        let first = !self.armed.swap(true, Ordering::SeqCst);
        self.parking.unpark_all();
        first
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Block until armed; `Cancelled` if the pool closes first
    pub fn wait(&self, token: &CancellationToken) -> JobResult<()> {
        loop {
            token.check()?;
            if self.is_armed() {
                return Ok(());
            }

            let key = self.parking.prepare();
            token.check()?;
            if self.is_armed() {
                return Ok(());
            }
            self.parking.park(key, Some(self.park_timeout));
        }
    }

    /// Wake waiting lanes so they re-check the token
    pub fn interrupt(&self) {
        self.parking.unpark_all();
    }
}
