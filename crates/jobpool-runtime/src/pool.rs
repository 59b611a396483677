//! `JobPool` - the bidirectional pool handle
//!
//! Lifecycle: constructed (lanes spawned, parked on the arm latch) ->
//! armed (by the one-shot [`JobPool::run`]) -> cancelled (by
//! [`JobPool::close`], terminal). Brand-new jobs enter through queue B.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use jobpool_core::{
    handler_fn, kdebug, kinfo, kwarn, Job, JobError, JobHandler, JobResult, SpinLock,
};

use crate::config::PoolConfig;
use crate::lane::{lane_loop, Direction, LaneId, Shared};
use crate::stats::{Counters, PoolStats};

/// A fixed set of lanes bouncing jobs between two queues
pub struct JobPool<J: Job> {
    shared: Arc<Shared<J>>,
    lanes: SpinLock<Vec<JoinHandle<()>>>,
    running: AtomicBool,
    config: PoolConfig,
}

impl<J: Job> JobPool<J> {
    /// Build the pool and spawn `2 * worker_pairs` parked lanes
    ///
    /// Fails with `InvalidArgument` for an out-of-range pair count and
    /// `SpawnFailed` if a lane thread cannot be created (lanes already
    /// spawned are cancelled before returning).
    pub fn new<H: JobHandler<J>>(config: PoolConfig, handler: H) -> JobResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared::new(&config, Box::new(handler)));
        let mut lanes = Vec::with_capacity(config.lane_count());

        for pair in 0..config.worker_pairs {
            for direction in [Direction::AtoB, Direction::BtoA] {
                let lane = LaneId { pair, direction };
                let inner = Arc::clone(&shared);
                let spawned = thread::Builder::new()
                    .name(format!("{}-{}", config.lane_name, lane))
                    .spawn(move || lane_loop(inner, lane));

                match spawned {
                    Ok(handle) => lanes.push(handle),
                    Err(e) => {
                        shared.token.cancel();
                        shared.interrupt_all();
                        return Err(JobError::SpawnFailed(e));
                    }
                }
            }
        }

        kdebug!("{}: {} lanes spawned, waiting for run()", config.lane_name, lanes.len());

        Ok(Self {
            shared,
            lanes: SpinLock::new(lanes),
            running: AtomicBool::new(false),
            config,
        })
    }

    /// Build a pool from separate read and write closures
    pub fn from_fns<R, W>(config: PoolConfig, read: R, write: W) -> JobResult<Self>
    where
        R: Fn(&mut J) -> JobResult<bool> + Send + Sync + 'static,
        W: Fn(&mut J) -> JobResult<bool> + Send + Sync + 'static,
    {
        Self::new(config, handler_fn(read, write))
    }

    /// Queue a new job; never blocks, never fails
    ///
    /// Jobs submitted before `run()` wait in queue B. Jobs submitted after
    /// `close()` are never processed and are dropped with the pool.
    pub fn submit(&self, job: J) {
        Counters::bump(&self.shared.counters.submitted);
        self.shared.queue_b.enqueue(job);
    }

    /// Arm every lane, then block until all of them have exited
    ///
    /// Returns `Ok(())` once [`close`](Self::close) has been called and every
    /// lane has observed it. One-shot: a second call returns `AlreadyRunning`.
    pub fn run(&self) -> JobResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(JobError::AlreadyRunning);
        }

        let lanes = std::mem::take(&mut *self.lanes.lock());
        self.shared.latch.arm();
        kinfo!("{}: armed {} lanes", self.config.lane_name, lanes.len());

        for handle in lanes {
            let name = handle.thread().name().map(str::to_owned);
            if handle.join().is_err() {
                kwarn!("lane {} terminated by a handler panic", name.as_deref().unwrap_or("?"));
            }
        }
        Ok(())
    }

    /// Raise cancellation and wake every parked lane
    ///
    /// Idempotent; only the first call has an effect.
    pub fn close(&self) {
        if self.shared.token.cancel() {
            self.shared.interrupt_all();
            kinfo!("{}: closed ({})", self.config.lane_name, self.stats());
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.token.is_cancelled()
    }

    pub fn is_armed(&self) -> bool {
        self.shared.latch.is_armed()
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        self.shared.counters.snapshot()
    }

    /// Current lengths of queue A and queue B
    pub fn queued(&self) -> (usize, usize) {
        (self.shared.queue_a.len(), self.shared.queue_b.len())
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl<J: Job> Drop for JobPool<J> {
    fn drop(&mut self) {
        self.close();
        // Lanes not joined by run() are detached; they exit on their own
        // once they see the cancelled token.
    }
}
