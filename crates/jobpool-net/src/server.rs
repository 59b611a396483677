//! TCP server: accept loop feeding sessions into a job pool
//!
//! ```ignore
//! let server = Arc::new(Server::new(ServerConfig::from_env(), PerSessionFactory::<EchoHandler>::new())?);
//! // on another thread: server.stop();
//! let accept = server.start()?;   // blocks until stop()
//! accept.join()?;
//! ```

use std::io;
use std::net::SocketAddrV4;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use jobpool_core::{kdebug, kerror, kinfo, JobError};
use jobpool_runtime::{JobPool, PoolStats};

use crate::config::ServerConfig;
use crate::error::{NetError, NetResult};
use crate::handler::{HandlerFactory, SessionRouter};
use crate::listener::Listener;
use crate::registry::SessionRegistry;
use crate::session::Session;

pub struct Server {
    config: ServerConfig,
    pool: Arc<JobPool<Session>>,
    listener: Arc<Listener>,
    factory: Arc<dyn HandlerFactory>,
    registry: Arc<SessionRegistry>,
    started: AtomicBool,
    stopped: AtomicBool,
}

/// Handle to the accept loop still running after [`Server::start`] returns
pub struct AcceptLoop {
    handle: JoinHandle<NetResult<()>>,
}

impl AcceptLoop {
    /// Wait for the accept loop; `Ok` if it ended because the listener stopped
    pub fn join(self) -> NetResult<()> {
        self.handle
            .join()
            .unwrap_or_else(|_| Err(NetError::Accept(io::Error::other("accept thread panicked"))))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Server {
    /// Bind the listening socket and build the pool (lanes parked)
    pub fn new<F: HandlerFactory>(config: ServerConfig, factory: F) -> NetResult<Self> {
        config.validate()?;
        let listener = Listener::bind(config.socket_addr())?;
        let pool = JobPool::new(config.pool.clone(), SessionRouter)?;

        Ok(Self {
            config,
            pool: Arc::new(pool),
            listener: Arc::new(listener),
            factory: Arc::new(factory),
            registry: Arc::new(SessionRegistry::new()),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    /// Actual bound address (resolves port 0)
    pub fn local_addr(&self) -> SocketAddrV4 {
        self.listener.local_addr()
    }

    /// Listen, launch the accept loop, then run the pool until [`stop`](Self::stop)
    ///
    /// Blocks the caller. Returns the accept loop handle once the pool has
    /// shut down.
    pub fn start(&self) -> NetResult<AcceptLoop> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(NetError::Pool(JobError::AlreadyRunning));
        }
        self.listener.listen(self.config.backlog)?;
        kinfo!("listening on {}", self.local_addr());

        let handle = {
            let listener = Arc::clone(&self.listener);
            let pool = Arc::clone(&self.pool);
            let factory = Arc::clone(&self.factory);
            let registry = Arc::clone(&self.registry);
            let buffer_size = self.config.buffer_size;
            thread::Builder::new()
                .name(format!("{}-accept", self.config.pool.lane_name))
                .spawn(move || accept_loop(&listener, &pool, &*factory, &registry, buffer_size))
                .map_err(|e| {
                    self.stop();
                    NetError::Pool(JobError::SpawnFailed(e))
                })?
        };

        self.pool.run()?;
        Ok(AcceptLoop { handle })
    }

    /// Close the pool, stop the listener, shut down live sessions; idempotent
    ///
    /// Shutting the session sockets down unblocks any lane stuck in a send
    /// to a peer that stopped reading, so `start()` always returns.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.pool.close();
            self.listener.stop();
            let reached = self.registry.shutdown_all();
            if reached > 0 {
                kdebug!("shut down {} live sessions", reached);
            }
        }
    }

    /// True once the pool is armed and accepting
    pub fn is_running(&self) -> bool {
        self.pool.is_armed() && !self.pool.is_closed()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: &Listener,
    pool: &JobPool<Session>,
    factory: &dyn HandlerFactory,
    registry: &SessionRegistry,
    buffer_size: usize,
) -> NetResult<()> {
    loop {
        match listener.accept() {
            Ok((fd, peer)) => {
                let session = Session::new(fd, Some(peer), factory.create(), buffer_size);
                registry.register(&session);
                kdebug!("{} accepted from {}", session, peer);
                pool.submit(session);
            }
            Err(e) if e.is_listener_stopped() => {
                kinfo!("listener stopped");
                return Ok(());
            }
            Err(e) => {
                kerror!("accept loop terminated: {}", e);
                pool.close();
                return Err(e);
            }
        }
    }
}
