//! Condvar-based lane parking
//!
//! Used on platforms without futex support.
//! Less efficient but portable.

use super::Parking;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

/// Condvar-based parking
///
/// The waiter compares the epoch while holding the mutex and the notifier
/// takes the mutex after bumping it, so a bump can never slip between the
/// comparison and the wait.
pub struct CondvarParking {
    epoch: AtomicU32,
    mutex: Mutex<()>,
    condvar: Condvar,
    parked: AtomicUsize,
}

impl CondvarParking {
    /// Create a new condvar parking instance
    pub fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
            parked: AtomicUsize::new(0),
        }
    }

    // The mutex guards no data, so a poisoned lock is still usable
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutex.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        drop(self.lock());
    }
}

impl Default for CondvarParking {
    fn default() -> Self {
        Self::new()
    }
}

impl Parking for CondvarParking {
    #[inline]
    fn prepare(&self) -> u32 {
        self.epoch.load(Ordering::SeqCst)
    }

    fn park(&self, key: u32, timeout: Option<Duration>) -> bool {
        let guard = self.lock();
        self.parked.fetch_add(1, Ordering::SeqCst);

        let still = |_: &mut ()| self.epoch.load(Ordering::SeqCst) == key;
        let guard = match timeout {
            Some(t) => match self.condvar.wait_timeout_while(guard, t, still) {
                Ok((g, _)) => g,
                Err(e) => e.into_inner().0,
            },
            None => self
                .condvar
                .wait_while(guard, still)
                .unwrap_or_else(|e| e.into_inner()),
        };

        self.parked.fetch_sub(1, Ordering::SeqCst);
        drop(guard);
        self.epoch.load(Ordering::SeqCst) != key
    }

    fn unpark_one(&self) {
        self.bump();
        self.condvar.notify_one();
    }

    fn unpark_all(&self) {
        self.bump();
        self.condvar.notify_all();
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}
