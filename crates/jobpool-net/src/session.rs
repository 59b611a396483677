//! Network session: one accepted connection circulating as a job
//!
//! A session owns its socket and one fixed-size buffer reused for every
//! receive and send. Reads are non-blocking probes; writes block until the
//! whole payload is sent. Both run under the socket's I/O lock.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::net::SocketAddrV4;
use std::os::fd::{AsRawFd, OwnedFd};
use std::sync::{Arc, Mutex, MutexGuard};

use jobpool_core::{Job, JobId, Phase, SpinLock};

use crate::handler::SessionHandler;
use crate::sys;

/// Socket shared between a session and the registry
///
/// `io` is the per-session I/O lock and owns the descriptor. `control` is a
/// duplicate used only to shut the connection down from another thread
/// while a lane is blocked inside `io`.
pub struct SessionSocket {
    io: Mutex<Option<OwnedFd>>,
    control: SpinLock<Option<OwnedFd>>,
}

impl SessionSocket {
    fn new(fd: OwnedFd) -> Self {
        let control = fd.try_clone().ok();
        Self {
            io: Mutex::new(Some(fd)),
            control: SpinLock::new(control),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<OwnedFd>> {
        self.io.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Shut the connection down without taking the I/O lock
    ///
    /// A lane blocked in `send` or `recv` on this socket returns with an
    /// error or end-of-stream.
    pub fn shutdown(&self) {
        if let Some(fd) = self.control.lock().as_ref() {
            let _ = sys::shutdown(fd.as_raw_fd());
        }
    }

    /// Shut down and release both descriptors; idempotent
    fn close(&self) {
        let control = self.control.lock().take();
        if let Some(fd) = &control {
            let _ = sys::shutdown(fd.as_raw_fd());
        }
        drop(control);
        self.lock().take();
    }

    pub fn is_open(&self) -> bool {
        self.lock().is_some()
    }
}

fn not_connected() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "session closed")
}

/// One connection, as a job
pub struct Session {
    id: JobId,
    phase: Phase,
    buffer: Box<[u8]>,
    len: usize,
    peer: Option<SocketAddrV4>,
    handler: Arc<dyn SessionHandler>,
    socket: Arc<SessionSocket>,
}

impl Session {
    /// Wrap a connected socket; starts in `NeedsRead`
    ///
    /// The buffer is `handler.buffer_size()` bytes if the handler asks for a
    /// size, else `default_buffer`.
    pub fn new(
        fd: OwnedFd,
        peer: Option<SocketAddrV4>,
        handler: Arc<dyn SessionHandler>,
        default_buffer: usize,
    ) -> Self {
        let size = handler.buffer_size().unwrap_or(default_buffer).max(1);
        Self {
            id: JobId::next(),
            phase: Phase::NeedsRead,
            buffer: vec![0u8; size].into_boxed_slice(),
            len: 0,
            peer,
            handler,
            socket: Arc::new(SessionSocket::new(fd)),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn peer_addr(&self) -> Option<SocketAddrV4> {
        self.peer
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Handler this session was created with
    pub fn handler(&self) -> Arc<dyn SessionHandler> {
        Arc::clone(&self.handler)
    }

    pub fn socket(&self) -> &Arc<SessionSocket> {
        &self.socket
    }

    /// Non-blocking receive into the session buffer
    ///
    /// - `Ok(true)` with a payload: data arrived.
    /// - `Ok(true)` with an empty payload: the peer closed; phase is now `Closed`.
    /// - `Ok(false)`: nothing to read yet.
    /// - `Err`: any other socket failure.
    pub fn try_read(&mut self) -> io::Result<bool> {
        let guard = self.socket.lock();
        let fd = guard.as_ref().ok_or_else(not_connected)?.as_raw_fd();
        let _nb = sys::NonBlocking::enable(fd)?;

        self.len = 0;
        match sys::recv(fd, &mut self.buffer) {
            Ok(0) => {
                self.phase = Phase::Closed;
                Ok(true)
            }
            Ok(n) => {
                self.len = n;
                Ok(true)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Blocking send of `payload` through the session buffer
    ///
    /// The buffer is zero-filled, then the payload is copied in and sent in
    /// buffer-sized chunks. Overwrites the last received payload.
    pub fn try_write(&mut self, payload: &[u8]) -> io::Result<bool> {
        let guard = self.socket.lock();
        let fd = guard.as_ref().ok_or_else(not_connected)?.as_raw_fd();

        self.len = 0;
        self.buffer.fill(0);
        for chunk in payload.chunks(self.buffer.len()) {
            let staged = &mut self.buffer[..chunk.len()];
            staged.copy_from_slice(chunk);
            sys::send_all(fd, staged)?;
        }
        Ok(true)
    }

    pub fn write_str(&mut self, text: &str) -> io::Result<bool> {
        self.try_write(text.as_bytes())
    }

    /// Bytes from the most recent successful `try_read`
    pub fn last_payload(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    /// Last payload as text, invalid UTF-8 replaced
    pub fn last_value(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.last_payload())
    }

    /// Close the socket and mark the session `Closed`; idempotent
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
        self.socket.close();
    }
}

impl Job for Session {
    fn phase(&self) -> Phase {
        self.phase
    }

    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    fn id(&self) -> JobId {
        self.id
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.socket.close();
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Session: {}", self.id)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("peer", &self.peer)
            .field("buffer", &self.buffer.len())
            .finish()
    }
}
