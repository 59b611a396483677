//! Job and handler traits
//!
//! A job is any stateful value that carries a [`Phase`]. The pool owns a job
//! while it sits in a queue, hands it by `&mut` to exactly one lane at a time,
//! and drops it once a handler reports failure or the phase becomes `Closed`.
//!
//! A handler supplies the two capabilities the pool dispatches to:
//! `on_read` for `NeedsRead` jobs and `on_write` for `NeedsWrite` jobs.
//! Handlers are expected to move the phase themselves to drive the bounce.

use crate::error::JobResult;
use crate::id::JobId;
use crate::phase::Phase;

/// A stateful unit of work circulating through the pool
pub trait Job: Send + 'static {
    /// Current phase; read by the lane after claiming the job
    fn phase(&self) -> Phase;

    /// Set the phase. The pool only ever sets `Closed` (on handler fault).
    fn set_phase(&mut self, phase: Phase);

    /// Identity for log lines
    fn id(&self) -> JobId {
        JobId::NONE
    }
}

/// Read/write capability set the pool routes jobs to
///
/// Returning `Ok(false)` drops the job regardless of its phase.
/// Returning `Err` drops the job as well and is logged by the lane.
pub trait JobHandler<J: Job>: Send + Sync + 'static {
    /// Called for jobs in `NeedsRead`
    fn on_read(&self, job: &mut J) -> JobResult<bool>;

    /// Called for jobs in `NeedsWrite`
    fn on_write(&self, job: &mut J) -> JobResult<bool>;
}

/// Handler built from a pair of closures
///
/// Built with [`handler_fn`].
pub struct FnHandler<R, W> {
    read: R,
    write: W,
}

/// Build a handler from a read closure and a write closure
///
/// ```ignore
/// let handler = handler_fn(
///     |job: &mut Ping| { job.set_phase(Phase::NeedsWrite); Ok(true) },
///     |job: &mut Ping| { job.set_phase(Phase::Closed); Ok(true) },
/// );
/// ```
pub fn handler_fn<J, R, W>(read: R, write: W) -> FnHandler<R, W>
where
    J: Job,
    R: Fn(&mut J) -> JobResult<bool> + Send + Sync + 'static,
    W: Fn(&mut J) -> JobResult<bool> + Send + Sync + 'static,
{
    FnHandler { read, write }
}

impl<J, R, W> JobHandler<J> for FnHandler<R, W>
where
    J: Job,
    R: Fn(&mut J) -> JobResult<bool> + Send + Sync + 'static,
    W: Fn(&mut J) -> JobResult<bool> + Send + Sync + 'static,
{
    #[inline]
    fn on_read(&self, job: &mut J) -> JobResult<bool> {
        (self.read)(job)
    }

    #[inline]
    fn on_write(&self, job: &mut J) -> JobResult<bool> {
        (self.write)(job)
    }
}

impl<J: Job, H: JobHandler<J>> JobHandler<J> for std::sync::Arc<H> {
    fn on_read(&self, job: &mut J) -> JobResult<bool> {
        (**self).on_read(job)
    }

    fn on_write(&self, job: &mut J) -> JobResult<bool> {
        (**self).on_write(job)
    }
}
