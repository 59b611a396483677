//! Listening socket with an out-of-band stop
//!
//! `accept` blocks in the kernel. [`Listener::stop`] raises a flag and shuts
//! the socket down, which makes a blocked `accept` return at once; the flag
//! turns that failure into [`NetError::ListenerStopped`].

use std::io;
use std::net::SocketAddrV4;
use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{NetError, NetResult};
use crate::sys;

pub struct Listener {
    fd: OwnedFd,
    local: SocketAddrV4,
    stopped: AtomicBool,
}

impl Listener {
    /// Create and bind the socket; connections are refused until [`listen`](Self::listen)
    pub fn bind(addr: SocketAddrV4) -> NetResult<Self> {
        let fd = sys::bind(addr).map_err(NetError::Bind)?;
        let local = sys::local_addr(fd.as_raw_fd()).map_err(NetError::Bind)?;
        Ok(Self {
            fd,
            local,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn listen(&self, backlog: i32) -> NetResult<()> {
        sys::listen(self.fd.as_raw_fd(), backlog).map_err(NetError::Listen)
    }

    /// Bound address with the real port when bound to port 0
    pub fn local_addr(&self) -> SocketAddrV4 {
        self.local
    }

    /// Block until a client connects
    ///
    /// `EINTR` and `ECONNABORTED` (client gave up before we accepted) are
    /// retried. After [`stop`](Self::stop) every call returns `ListenerStopped`.
    pub fn accept(&self) -> NetResult<(OwnedFd, SocketAddrV4)> {
        loop {
            if self.is_stopped() {
                return Err(NetError::ListenerStopped);
            }
            match sys::accept(self.fd.as_raw_fd()) {
                Ok(conn) => return Ok(conn),
                Err(_) if self.is_stopped() => return Err(NetError::ListenerStopped),
                Err(e) if is_transient(&e) => continue,
                Err(e) => return Err(NetError::Accept(e)),
            }
        }
    }

    /// Stop accepting; idempotent
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            // ENOTCONN on a listener that never listened; nothing to wake then
            let _ = sys::shutdown(self.fd.as_raw_fd());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

fn is_transient(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::Interrupted || e.raw_os_error() == Some(libc::ECONNABORTED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpStream};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn loopback() -> Listener {
        let l = Listener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0)).unwrap();
        l.listen(16).unwrap();
        l
    }

    #[test]
    fn test_accept_reports_peer() {
        let listener = loopback();
        let client = TcpStream::connect(listener.local_addr()).unwrap();
        let (_fd, peer) = listener.accept().unwrap();
        assert_eq!(std::net::SocketAddr::V4(peer), client.local_addr().unwrap());
    }

    #[test]
    fn test_stop_unblocks_accept() {
        let listener = Arc::new(loopback());
        let acceptor = {
            let l = Arc::clone(&listener);
            thread::spawn(move || l.accept().map(|_| ()))
        };

        thread::sleep(Duration::from_millis(50));
        let start = Instant::now();
        listener.stop();
        listener.stop();

        let result = acceptor.join().unwrap();
        assert!(matches!(result, Err(NetError::ListenerStopped)));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_port_in_use() {
        let first = loopback();
        // SO_REUSEADDR does not allow two listeners on the same port
        let second = Listener::bind(first.local_addr()).and_then(|l| l.listen(16));
        assert!(matches!(second, Err(NetError::Bind(_)) | Err(NetError::Listen(_))));
    }
}
