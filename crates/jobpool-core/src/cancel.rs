//! Cancellation token for cooperative shutdown
//!
//! One token is shared by every lane of a pool. Blocking waits (gate
//! acquisition, dequeue, the pre-arm pause) check it before and after
//! preparing to park, and the owner wakes every parked waiter after raising
//! it, so a cancel is observed on the next wake.

use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use crate::error::{JobError, JobResult};

/// Token for checking and triggering cancellation
///
/// Clones share state. Raising the token is idempotent: only the first
/// [`cancel`](Self::cancel) call reports `true`.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

struct TokenInner {
    /// Cancellation flag
    cancelled: AtomicBool,
}

impl CancellationToken {
    /// Create a new independent token
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Check if cancellation was requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation
    ///
    /// Returns `true` if this call raised the flag, `false` if it was
    /// already raised. Safe to call any number of times from any thread.
    pub fn cancel(&self) -> bool {
        !self.inner.cancelled.swap(true, Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancellation was requested
    ///
    /// ```ignore
    /// loop {
    ///     token.check()?;
    ///     // ... one unit of work ...
    /// }
    /// ```
    #[inline]
    pub fn check(&self) -> JobResult<()> {
        if self.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
