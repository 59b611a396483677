//! Outbound session driven by its own job pool
//!
//! The connection becomes a single session bouncing between the queues of a
//! private pool. Outgoing messages wait in a lock-free outbox and are sent
//! on the next write step; every received payload goes to a callback.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::os::fd::OwnedFd;
use std::sync::Arc;

use crossbeam_queue::SegQueue;
use jobpool_core::{kdebug, Job, JobId, JobResult, Phase};
use jobpool_runtime::{JobPool, PoolConfig, PoolStats};

use crate::config::DEFAULT_BUFFER_SIZE;
use crate::error::{NetError, NetResult};
use crate::handler::{SessionHandler, SessionRouter};
use crate::session::{Session, SessionSocket};

type Outbox = Arc<SegQueue<Vec<u8>>>;

struct ClientHandler<F> {
    outbox: Outbox,
    on_payload: F,
}

impl<F> SessionHandler for ClientHandler<F>
where
    F: Fn(&[u8]) + Send + Sync + 'static,
{
    fn on_read(&self, session: &mut Session) -> JobResult<bool> {
        let got = session.try_read()?;
        if got {
            if session.is_closed() {
                kdebug!("{} closed by server", session);
                session.close();
                return Ok(false);
            }
            (self.on_payload)(session.last_payload());
        }

        if !self.outbox.is_empty() {
            session.set_phase(Phase::NeedsWrite);
        } else if !got {
            std::thread::yield_now();
        }
        Ok(true)
    }

    fn on_write(&self, session: &mut Session) -> JobResult<bool> {
        if let Some(message) = self.outbox.pop() {
            session.try_write(&message)?;
        }
        session.set_phase(Phase::NeedsRead);
        Ok(true)
    }
}

/// Client side of one connection
pub struct SessionClient {
    pool: JobPool<Session>,
    outbox: Outbox,
    socket: Arc<SessionSocket>,
    id: JobId,
    peer: SocketAddr,
}

impl SessionClient {
    /// Connect and queue the session; nothing moves until [`run`](Self::run)
    pub fn connect<A, F>(addr: A, config: PoolConfig, on_payload: F) -> NetResult<Self>
    where
        A: ToSocketAddrs,
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        let stream = TcpStream::connect(addr).map_err(NetError::Connect)?;
        let peer = stream.peer_addr().map_err(NetError::Connect)?;
        let _ = stream.set_nodelay(true);

        let outbox: Outbox = Arc::new(SegQueue::new());
        let handler = Arc::new(ClientHandler { outbox: Arc::clone(&outbox), on_payload });
        let peer_v4 = match peer {
            SocketAddr::V4(v4) => Some(v4),
            SocketAddr::V6(_) => None,
        };
        let session = Session::new(OwnedFd::from(stream), peer_v4, handler, DEFAULT_BUFFER_SIZE);
        let socket = Arc::clone(session.socket());
        let id = session.id();

        let pool = JobPool::new(config, SessionRouter)?;
        pool.submit(session);

        Ok(Self { pool, outbox, socket, id, peer })
    }

    /// Queue a message; sent on the session's next write step
    pub fn send(&self, message: impl Into<Vec<u8>>) {
        self.outbox.push(message.into());
    }

    /// Drive the connection until [`close`](Self::close)
    pub fn run(&self) -> NetResult<()> {
        self.pool.run()?;
        Ok(())
    }

    /// Stop the pool and shut the connection down; idempotent
    pub fn close(&self) {
        self.pool.close();
        self.socket.shutdown();
    }

    /// False once the server closed the connection or [`close`](Self::close) ran
    pub fn is_connected(&self) -> bool {
        self.socket.is_open() && !self.pool.is_closed()
    }

    pub fn is_running(&self) -> bool {
        self.pool.is_armed() && !self.pool.is_closed()
    }

    /// Messages queued but not yet sent
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

impl Drop for SessionClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::handler::PerSessionFactory;
    use crate::handlers::EchoHandler;
    use crate::server::{AcceptLoop, Server};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_for(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_client_against_echo_server() {
        let server = Server::new(
            ServerConfig::loopback().pool(PoolConfig::new().worker_pairs(1)),
            PerSessionFactory::<EchoHandler>::new(),
        )
        .unwrap();

        thread::scope(|s| {
            let serving = s.spawn(|| server.start().and_then(AcceptLoop::join));
            assert!(wait_for(|| server.is_running()));

            let received = Arc::new(Mutex::new(Vec::<u8>::new()));
            let sink = Arc::clone(&received);
            let client = Arc::new(
                SessionClient::connect(
                    server.local_addr(),
                    PoolConfig::new().worker_pairs(1).lane_name("client"),
                    move |bytes: &[u8]| sink.lock().unwrap().extend_from_slice(bytes),
                )
                .unwrap(),
            );
            let driving = {
                let client = Arc::clone(&client);
                s.spawn(move || client.run())
            };
            assert!(wait_for(|| client.is_running()));

            let mut expected = Vec::new();
            for word in ["one", "two", "three"] {
                client.send(word);
                expected.extend_from_slice(format!("Echo: {}", word).as_bytes());
                assert!(wait_for(|| *received.lock().unwrap() == expected));
            }
            assert_eq!(client.pending(), 0);
            assert!(client.is_connected());

            client.close();
            client.close();
            assert!(!client.is_connected());
            assert!(driving.join().unwrap().is_ok());

            server.stop();
            assert!(serving.join().unwrap().is_ok());
        });
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to find a port with no listener
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let result = SessionClient::connect(("127.0.0.1", port), PoolConfig::new().worker_pairs(1), |_: &[u8]| {});
        assert!(matches!(result, Err(NetError::Connect(_))));
    }
}
