//! # jobpool - bidirectional job pool
//!
//! A fixed set of worker lanes bounces stateful jobs between two unbounded
//! queues. Each lane claims a job under its queue's gate, routes it by phase
//! to a read or write handler, and forwards it to the opposite queue until
//! the handler drops it or the phase becomes `Closed`.
//!
//! The TCP layer instantiates this with one [`Session`] per accepted
//! connection.
//!
//! ## Quick Start
//!
//! ```ignore
//! use jobpool::{EchoHandler, PerSessionFactory, Server, ServerConfig};
//! use std::sync::Arc;
//!
//! let server = Arc::new(Server::new(
//!     ServerConfig::from_env(),
//!     PerSessionFactory::<EchoHandler>::new(),
//! )?);
//!
//! let stopper = Arc::clone(&server);
//! std::thread::spawn(move || {
//!     // ... wait for a stop request ...
//!     stopper.stop();
//! });
//!
//! server.start()?.join()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//!   accept ──► Session (NeedsRead) ──► submit
//!                                        │
//!                                        ▼
//!      ┌──────────[B]◄──── a2b lanes ◄────[A]◄─────────┐
//!      │                                                │
//!      └──────────► b2a lanes: on_read / on_write ──────┘
//!                         │
//!                         ▼ Ok(false) or Closed
//!                       drop
//! ```

// Core types
pub use jobpool_core::{
    handler_fn, CancellationToken, FnHandler, Job, JobError, JobHandler, JobId, JobResult, Phase,
};

// Logging
pub use jobpool_core::{kdebug, kerror, kinfo, kprintln, ktrace, kwarn};
pub use jobpool_core::kprint::{
    init as init_logging, set_flush_enabled, set_log_level, set_thread_enabled, LogLevel,
};

// Environment helpers
pub use jobpool_core::{env_get, env_get_bool, env_get_millis, env_get_opt, env_get_str};

// Engine
pub use jobpool_runtime::{current_lane, Direction, JobPool, LaneId, PoolConfig, PoolStats};

// Sockets
pub use jobpool_net::{
    AcceptLoop, EchoHandler, FileHandler, FnFactory, HandlerFactory, NetError, NetResult,
    PerSessionFactory, Server, ServerConfig, Session, SessionClient, SessionHandler,
    SessionRegistry, SharedFactory,
};
