//! # jobpool-net
//!
//! Raw-socket TCP layer on top of the job pool: every accepted connection
//! is a [`Session`] job bouncing between the pool's queues, its reads and
//! writes delegated to a pluggable [`SessionHandler`].
//!
//! ## Modules
//!
//! - `sys` - libc/nix socket wrappers
//! - `listener` - Listening socket with an out-of-band stop
//! - `session` - Session job: socket, reusable buffer, phase
//! - `handler` - Handler and factory traits, pool-level router
//! - `handlers` - Echo and accumulate-to-file handlers
//! - `registry` - Weak handles to live sessions for forced shutdown
//! - `server` - Accept loop feeding a pool
//! - `client` - Outbound session driven by its own pool
//! - `config` - Server configuration
//! - `error` - Error types

pub mod sys;
pub mod listener;
pub mod session;
pub mod handler;
pub mod handlers;
pub mod registry;
pub mod server;
pub mod client;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use listener::Listener;
pub use session::{Session, SessionSocket};
pub use handler::{FnFactory, HandlerFactory, PerSessionFactory, SessionHandler, SessionRouter, SharedFactory};
pub use handlers::{EchoHandler, FileHandler};
pub use registry::SessionRegistry;
pub use server::{AcceptLoop, Server};
pub use client::SessionClient;
pub use config::{ServerConfig, DEFAULT_BACKLOG, DEFAULT_BUFFER_SIZE, DEFAULT_PORT};
pub use error::{NetError, NetResult};
