//! Server configuration
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `JP_BIND_ADDR` | 0.0.0.0 | IPv4 address to listen on |
//! | `JP_PORT` | 9999 | TCP port |
//! | `JP_BACKLOG` | 1024 | `listen(2)` backlog |
//! | `JP_BUFFER_SIZE` | 65535 | Per-session buffer unless the handler asks for another size |
//!
//! Pool settings come from [`PoolConfig::from_env`].

use std::net::{Ipv4Addr, SocketAddrV4};

use jobpool_core::env_get;
use jobpool_runtime::PoolConfig;

use crate::error::{NetError, NetResult};

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_BACKLOG: i32 = 1024;
pub const DEFAULT_BUFFER_SIZE: usize = 65535;

/// Configuration for a [`Server`](crate::Server)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: Ipv4Addr,
    pub port: u16,
    pub backlog: i32,
    pub buffer_size: usize,
    pub pool: PoolConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: Ipv4Addr::UNSPECIFIED,
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            buffer_size: DEFAULT_BUFFER_SIZE,
            pool: PoolConfig::default().lane_name("server"),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `JP_*` environment variables
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            bind_addr: env_get("JP_BIND_ADDR", d.bind_addr),
            port: env_get("JP_PORT", d.port),
            backlog: env_get("JP_BACKLOG", d.backlog),
            buffer_size: env_get("JP_BUFFER_SIZE", d.buffer_size),
            pool: PoolConfig::from_env().lane_name("server"),
        }
    }

    pub fn bind_addr(mut self, addr: Ipv4Addr) -> Self {
        self.bind_addr = addr;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn backlog(mut self, backlog: i32) -> Self {
        self.backlog = backlog;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Loopback on an ephemeral port
    pub fn loopback() -> Self {
        Self::new().bind_addr(Ipv4Addr::LOCALHOST).port(0)
    }

    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.bind_addr, self.port)
    }

    pub fn validate(&self) -> NetResult<()> {
        if self.buffer_size == 0 {
            return Err(NetError::Config("buffer_size must be at least 1"));
        }
        if self.backlog <= 0 {
            return Err(NetError::Config("backlog must be positive"));
        }
        self.pool.validate()?;
        Ok(())
    }
}
