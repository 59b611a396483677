//! Lane parking
//!
//! Sleep/wake for lanes blocked on a gate, an empty queue or the arm latch.
//! Platform-specific implementations use the most efficient primitive available.
//!
//! Parking is an event count: every unpark bumps an epoch, and a waiter only
//! sleeps while the epoch still equals the key it read before its final
//! condition check. The waiter side always follows the same shape:
//!
//! ```ignore
//! loop {
//!     if ready() { break; }
//!     let key = parking.prepare();
//!     if ready() || token.is_cancelled() { continue; }
//!     parking.park(key, Some(timeout));
//! }
//! ```
//!
//! A wake issued between `prepare` and `park` moves the epoch, so `park`
//! returns at once instead of losing it.

use std::time::Duration;

/// Platform-specific lane parking
pub trait Parking: Send + Sync {
    /// Snapshot the epoch; pass it to [`park`](Self::park) after re-checking
    /// the wait condition
    fn prepare(&self) -> u32;

    /// Sleep while the epoch equals `key`, or until `timeout` elapses
    ///
    /// Returns `true` if the epoch moved (woken or a wake raced ahead of us),
    /// `false` on timeout or a spurious return with the epoch unchanged.
    /// Callers re-check their condition either way.
    fn park(&self, key: u32, timeout: Option<Duration>) -> bool;

    /// Bump the epoch and wake one sleeper
    fn unpark_one(&self);

    /// Bump the epoch and wake every sleeper (close, arm)
    fn unpark_all(&self);

    /// Number of lanes currently inside `park` (hint, may be stale)
    fn parked_count(&self) -> usize;
}

mod fallback;
pub use fallback::CondvarParking;

// Platform-specific implementations
cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexParking;
        pub use futex_linux::FutexParking as PlatformParking;
    } else {
        pub use fallback::CondvarParking as PlatformParking;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn check_timeout<P: Parking>(parking: &P) {
        let key = parking.prepare();
        let start = Instant::now();
        let woken = parking.park(key, Some(Duration::from_millis(50)));
        let elapsed = start.elapsed();

        assert!(!woken);
        assert!(elapsed >= Duration::from_millis(40)); // Allow some slack
        assert_eq!(parking.parked_count(), 0);
    }

    fn check_stale_key_returns<P: Parking>(parking: &P) {
        let key = parking.prepare();
        parking.unpark_one();

        // The wake landed between prepare and park: must not sleep
        let start = Instant::now();
        assert!(parking.park(key, Some(Duration::from_secs(10))));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    fn check_unpark_one<P: Parking + 'static>(parking: Arc<P>) {
        let p2 = Arc::clone(&parking);
        let handle = thread::spawn(move || {
            let key = p2.prepare();
            p2.park(key, Some(Duration::from_secs(10)))
        });

        // Give thread time to park
        while parking.parked_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        parking.unpark_one();

        assert!(handle.join().unwrap());
    }

    fn check_unpark_all<P: Parking + 'static>(parking: Arc<P>) {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let p = Arc::clone(&parking);
                let key = p.prepare();
                thread::spawn(move || p.park(key, Some(Duration::from_secs(10))))
            })
            .collect();

        let deadline = Instant::now() + Duration::from_secs(5);
        while parking.parked_count() < 4 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        let start = Instant::now();
        parking.unpark_all();

        for h in handles {
            assert!(h.join().unwrap());
        }
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_platform_parking() {
        check_timeout(&PlatformParking::new());
        check_stale_key_returns(&PlatformParking::new());
        check_unpark_one(Arc::new(PlatformParking::new()));
        check_unpark_all(Arc::new(PlatformParking::new()));
    }

    #[test]
    fn test_condvar_parking() {
        check_timeout(&CondvarParking::new());
        check_stale_key_returns(&CondvarParking::new());
        check_unpark_one(Arc::new(CondvarParking::new()));
        check_unpark_all(Arc::new(CondvarParking::new()));
    }
}
