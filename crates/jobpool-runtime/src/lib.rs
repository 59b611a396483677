//! # jobpool-runtime
//!
//! The bidirectional job pool engine.
//!
//! This crate provides:
//! - Lane parking (futex on Linux, condvar elsewhere)
//! - The single-permit claim gate in front of each queue
//! - Unbounded MPMC job queues with cancellable dequeue
//! - The arm latch that holds lanes until `run()`
//! - Lanes and the `JobPool` handle (submit / run / close)
//!
//! ```ignore
//! let pool = JobPool::new(PoolConfig::from_env(), handler)?;
//! pool.submit(job);
//! std::thread::scope(|s| {
//!     s.spawn(|| pool.run());
//!     // ...
//!     pool.close();
//! });
//! ```

pub mod config;
pub mod parking;
pub mod gate;
pub mod queue;
pub mod latch;
pub mod lane;
pub mod pool;
pub mod stats;

// Re-exports
pub use config::{default_worker_pairs, PoolConfig, DEFAULT_PARK_TIMEOUT, MAX_WORKER_PAIRS};
pub use parking::{Parking, PlatformParking};
pub use gate::{Gate, GatePermit};
pub use queue::JobQueue;
pub use latch::ArmLatch;
pub use lane::{current_lane, Direction, LaneId};
pub use pool::JobPool;
pub use stats::PoolStats;
