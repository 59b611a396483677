//! Error types for the socket layer

use core::fmt;
use std::io;

use jobpool_core::JobError;

/// Result type for server and client operations
pub type NetResult<T> = Result<T, NetError>;

/// Errors raised by the listener, server and client
#[derive(Debug)]
pub enum NetError {
    /// Creating or binding the listening socket failed
    Bind(io::Error),

    /// `listen(2)` failed
    Listen(io::Error),

    /// A non-recoverable accept failure; ends the accept loop
    Accept(io::Error),

    /// The listener was stopped on purpose; the expected way out of accept
    ListenerStopped,

    /// Outbound connect failed
    Connect(io::Error),

    /// Invalid server configuration
    Config(&'static str),

    /// Error from the underlying job pool
    Pool(JobError),
}

impl NetError {
    /// True for the intentional-shutdown signal
    pub fn is_listener_stopped(&self) -> bool {
        matches!(self, NetError::ListenerStopped)
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Bind(e) => write!(f, "bind failed: {}", e),
            NetError::Listen(e) => write!(f, "listen failed: {}", e),
            NetError::Accept(e) => write!(f, "accept failed: {}", e),
            NetError::ListenerStopped => write!(f, "listener stopped"),
            NetError::Connect(e) => write!(f, "connect failed: {}", e),
            NetError::Config(msg) => write!(f, "invalid config: {}", msg),
            NetError::Pool(e) => write!(f, "pool error: {}", e),
        }
    }
}

impl std::error::Error for NetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetError::Bind(e) | NetError::Listen(e) | NetError::Accept(e) | NetError::Connect(e) => Some(e),
            NetError::Pool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<JobError> for NetError {
    fn from(e: JobError) -> Self {
        NetError::Pool(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_source() {
        use std::error::Error;

        let e = NetError::Accept(io::Error::from_raw_os_error(libc::EMFILE));
        assert!(e.to_string().starts_with("accept failed: "));
        assert!(e.source().is_some());

        assert_eq!(NetError::ListenerStopped.to_string(), "listener stopped");
        assert!(NetError::ListenerStopped.is_listener_stopped());

        let e: NetError = JobError::AlreadyRunning.into();
        assert_eq!(e.to_string(), "pool error: pool already running");
    }
}
