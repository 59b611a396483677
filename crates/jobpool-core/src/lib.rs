//! # jobpool-core
//!
//! Core types and traits for the bidirectional job pool.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! The engine itself (queues, gates, lanes) lives in `jobpool-runtime`;
//! sockets and sessions live in `jobpool-net`.
//!
//! ## Modules
//!
//! - `id` - Job identifier type
//! - `phase` - Job phase enum driving dispatch and termination
//! - `job` - `Job` and `JobHandler` traits
//! - `cancel` - Cancellation token shared by every lane of a pool
//! - `error` - Error types
//! - `spinlock` - Spinlock for short critical sections
//! - `kprint` - Leveled stderr logging macros
//! - `env` - Environment variable utilities

pub mod id;
pub mod phase;
pub mod job;
pub mod cancel;
pub mod error;
pub mod spinlock;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use id::JobId;
pub use phase::Phase;
pub use job::{handler_fn, FnHandler, Job, JobHandler};
pub use cancel::CancellationToken;
pub use error::{JobError, JobResult};
pub use spinlock::{SpinLock, SpinLockGuard};
pub use env::{env_get, env_get_bool, env_get_millis, env_get_opt, env_get_str};
