//! Example session handlers: echo and accumulate-to-file

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use jobpool_core::{env_get_str, kdebug, ktrace, Job, JobId, JobResult, Phase};
use jobpool_runtime::current_lane;

use crate::handler::SessionHandler;
use crate::session::Session;

/// Replies to every payload with `prefix + payload`
pub struct EchoHandler {
    prefix: Vec<u8>,
}

impl EchoHandler {
    pub const DEFAULT_PREFIX: &'static str = "Echo: ";
    pub const BUFFER_SIZE: usize = 65535;

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into().into_bytes() }
    }
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }
}

impl SessionHandler for EchoHandler {
    fn on_read(&self, session: &mut Session) -> JobResult<bool> {
        if !session.try_read()? {
            // Nothing yet: stay in NeedsRead and let other jobs through
            std::thread::yield_now();
            return Ok(true);
        }
        if session.is_closed() {
            kdebug!("{} closed by peer", session);
            session.close();
            return Ok(false);
        }
        session.set_phase(Phase::NeedsWrite);
        Ok(true)
    }

    fn on_write(&self, session: &mut Session) -> JobResult<bool> {
        let mut reply = Vec::with_capacity(self.prefix.len() + session.last_payload().len());
        reply.extend_from_slice(&self.prefix);
        reply.extend_from_slice(session.last_payload());

        if let Some(lane) = current_lane() {
            ktrace!("{} echo {} bytes on lane {}", session, reply.len(), lane);
        }
        session.try_write(&reply)?;
        session.set_phase(Phase::NeedsRead);
        Ok(true)
    }

    fn buffer_size(&self) -> Option<usize> {
        Some(Self::BUFFER_SIZE)
    }
}

/// Collects everything each connection sends, writes it to a file on close
///
/// The file is `<dir>/jobpool-<pid>-<session id>.txt`. One instance can
/// serve many sessions at once; their bytes are kept apart by session id.
pub struct FileHandler {
    dir: PathBuf,
    data: Mutex<HashMap<JobId, Vec<u8>>>,
}

impl FileHandler {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), data: Mutex::new(HashMap::new()) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Sessions with bytes collected but not yet saved
    pub fn pending(&self) -> usize {
        self.data().len()
    }

    fn data(&self) -> MutexGuard<'_, HashMap<JobId, Vec<u8>>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flush(&self, session: &Session) -> JobResult<PathBuf> {
        let bytes = self.data().remove(&session.id()).unwrap_or_default();
        let path = self
            .dir
            .join(format!("jobpool-{}-{}.txt", std::process::id(), session.id()));
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Directory from `JP_FILE_DIR`, else the working directory
impl Default for FileHandler {
    fn default() -> Self {
        Self::new(env_get_str("JP_FILE_DIR", "."))
    }
}

impl SessionHandler for FileHandler {
    fn on_read(&self, session: &mut Session) -> JobResult<bool> {
        if !session.try_read()? {
            std::thread::yield_now();
            return Ok(true);
        }
        if session.is_closed() {
            let written = self.flush(session);
            session.close();
            let path = written?;
            kdebug!("{} saved to {}", session, path.display());
            return Ok(false);
        }

        self.data()
            .entry(session.id())
            .or_default()
            .extend_from_slice(session.last_payload());
        session.set_phase(Phase::NeedsWrite);
        Ok(true)
    }

    /// Nothing to send back
    fn on_write(&self, session: &mut Session) -> JobResult<bool> {
        session.set_phase(Phase::NeedsRead);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::connected;
    use std::io::{Read, Write};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Drive a handler by hand until the session leaves circulation
    fn drive(handler: &dyn SessionHandler, session: &mut Session, until: impl Fn(&Session) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            let keep = match session.phase() {
                Phase::NeedsRead => handler.on_read(session).unwrap(),
                Phase::NeedsWrite => handler.on_write(session).unwrap(),
                _ => false,
            };
            if !keep || until(session) {
                return keep;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("handler did not settle");
    }

    #[test]
    fn test_echo_round_trip() {
        let handler = Arc::new(EchoHandler::default());
        let (mut session, mut client) = connected(handler.clone(), 64);
        assert_eq!(session.buffer_size(), EchoHandler::BUFFER_SIZE);

        client.write_all(b"abc").unwrap();
        assert!(drive(&*handler, &mut session, |s| s.phase() == Phase::NeedsWrite));
        assert!(handler.on_write(&mut session).unwrap());
        assert_eq!(session.phase(), Phase::NeedsRead);

        let mut reply = [0u8; 9];
        client.read_exact(&mut reply).unwrap();
        assert_eq!(&reply, b"Echo: abc");

        drop(client);
        assert!(!drive(&*handler, &mut session, |_| false));
        assert!(session.is_closed());
    }

    #[test]
    fn test_echo_custom_prefix() {
        let handler = Arc::new(EchoHandler::with_prefix("> "));
        let (mut session, mut client) = connected(handler.clone(), 64);

        client.write_all(b"hi").unwrap();
        drive(&*handler, &mut session, |s| s.phase() == Phase::NeedsWrite);
        handler.on_write(&mut session).unwrap();

        let mut reply = [0u8; 4];
        client.read_exact(&mut reply).unwrap();
        assert_eq!(&reply, b"> hi");
    }

    #[test]
    fn test_file_handler_writes_on_close() {
        let dir = std::env::temp_dir().join(format!("jobpool-file-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let handler = Arc::new(FileHandler::new(&dir));
        let (mut session, mut client) = connected(handler.clone(), 8);
        let id = session.id();

        client.write_all(b"first line\n").unwrap();
        client.write_all(b"second line\n").unwrap();
        client.shutdown(std::net::Shutdown::Write).unwrap();

        assert!(!drive(&*handler, &mut session, |_| false));
        assert!(session.is_closed());

        let path = dir.join(format!("jobpool-{}-{}.txt", std::process::id(), id));
        assert_eq!(std::fs::read(&path).unwrap(), b"first line\nsecond line\n");
        assert_eq!(handler.pending(), 0);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_handler_keeps_sessions_apart() {
        let dir = std::env::temp_dir().join(format!("jobpool-file-shared-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let handler = Arc::new(FileHandler::new(&dir));
        let (mut first, mut first_peer) = connected(handler.clone(), 8);
        let (mut second, mut second_peer) = connected(handler.clone(), 8);

        // Interleave the two connections through the one handler
        first_peer.write_all(b"one-a ").unwrap();
        drive(&*handler, &mut first, |s| s.phase() == Phase::NeedsWrite);
        handler.on_write(&mut first).unwrap();

        second_peer.write_all(b"two-a ").unwrap();
        drive(&*handler, &mut second, |s| s.phase() == Phase::NeedsWrite);
        handler.on_write(&mut second).unwrap();

        first_peer.write_all(b"one-b").unwrap();
        drive(&*handler, &mut first, |s| s.phase() == Phase::NeedsWrite);
        handler.on_write(&mut first).unwrap();
        assert_eq!(handler.pending(), 2);

        // First to close saves only its own bytes
        first_peer.shutdown(std::net::Shutdown::Write).unwrap();
        assert!(!drive(&*handler, &mut first, |_| false));
        assert_eq!(handler.pending(), 1);

        second_peer.write_all(b"two-b").unwrap();
        second_peer.shutdown(std::net::Shutdown::Write).unwrap();
        assert!(!drive(&*handler, &mut second, |_| false));
        assert_eq!(handler.pending(), 0);

        let saved = |id: JobId| {
            std::fs::read(dir.join(format!("jobpool-{}-{}.txt", std::process::id(), id))).unwrap()
        };
        assert_eq!(saved(first.id()), b"one-a one-b");
        assert_eq!(saved(second.id()), b"two-a two-b");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
