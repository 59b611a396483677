//! Error types for the job pool

use core::fmt;
use std::io;

/// Result type for pool and handler operations
pub type JobResult<T> = Result<T, JobError>;

/// Errors that can occur in pool operations
///
/// `Cancelled` is the expected shutdown path and is swallowed at the lane
/// boundary; it never reaches callers of `run()`.
#[derive(Debug)]
pub enum JobError {
    /// Operation was cancelled via CancellationToken
    Cancelled,

    /// Constructor argument out of range (e.g. zero worker pairs)
    InvalidArgument(&'static str),

    /// `run()` was already called on this pool
    AlreadyRunning,

    /// Failed to spawn a lane thread
    SpawnFailed(io::Error),

    /// A handler panicked; the job was dropped
    HandlerPanicked,

    /// Socket or file I/O failure surfaced by a handler
    Io(io::Error),
}

impl JobError {
    /// True for the expected shutdown signal
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobError::Cancelled)
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::Cancelled => write!(f, "operation cancelled"),
            JobError::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            JobError::AlreadyRunning => write!(f, "pool already running"),
            JobError::SpawnFailed(e) => write!(f, "failed to spawn lane thread: {}", e),
            JobError::HandlerPanicked => write!(f, "handler panicked"),
            JobError::Io(e) => write!(f, "i/o error: {}", e),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            JobError::SpawnFailed(e) | JobError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for JobError {
    fn from(e: io::Error) -> Self {
        JobError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let e = JobError::Cancelled;
        assert_eq!(format!("{}", e), "operation cancelled");

        let e = JobError::InvalidArgument("worker_pairs must be >= 1");
        assert_eq!(format!("{}", e), "invalid argument: worker_pairs must be >= 1");
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        fn fails() -> JobResult<()> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))?
        }

        let err = fails().unwrap_err();
        assert!(matches!(err, JobError::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));
        assert!(err.source().is_some());
        assert!(!err.is_cancelled());
        assert!(JobError::Cancelled.is_cancelled());
    }
}
