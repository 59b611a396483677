//! Job identifier type

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter backing [`JobId::next`]. Zero is never handed out.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a job (one per accepted connection in the server)
///
/// Identifiers are allocated from a process-wide counter, so two pools in
/// the same process never hand out the same id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Sentinel for jobs that do not carry an identity
    pub const NONE: JobId = JobId(0);

    /// Allocate the next unused identifier
    #[inline]
    pub fn next() -> Self {
        JobId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a raw value (tests, deserialised ids)
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        JobId(raw)
    }

    #[inline]
    pub const fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl Default for JobId {
    fn default() -> Self {
        JobId::NONE
    }
}

impl fmt::Debug for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            write!(f, "JobId(NONE)")
        } else {
            write!(f, "JobId({})", self.0)
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}
