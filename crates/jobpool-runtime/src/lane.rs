//! Worker lanes
//!
//! A lane is one OS thread looping over one direction of one pair:
//! claim a job from its source queue under that queue's gate, route it by
//! phase to the handler, then forward it to the opposite queue or drop it.
//!
//! ```text
//!   submit ──► [B] ──(b2a lanes)──► [A] ──(a2b lanes)──► [B] ──► ...
//! ```

use std::cell::Cell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use jobpool_core::{ktrace, kwarn, CancellationToken, Job, JobError, JobHandler, JobResult, Phase};

use crate::config::PoolConfig;
use crate::gate::Gate;
use crate::latch::ArmLatch;
use crate::queue::JobQueue;
use crate::stats::Counters;

/// Which queue a lane drains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Dequeue A, enqueue B
    AtoB,
    /// Dequeue B, enqueue A (first stop for submitted jobs)
    BtoA,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::AtoB => "a2b",
            Direction::BtoA => "b2a",
        }
    }
}

/// Identity of one lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneId {
    pub pair: usize,
    pub direction: Direction,
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.pair, self.direction.as_str())
    }
}

thread_local! {
    static CURRENT_LANE: Cell<Option<LaneId>> = const { Cell::new(None) };
}

/// Lane running on the calling thread, `None` outside a pool
///
/// Handlers can use this to tag log lines.
#[inline]
pub fn current_lane() -> Option<LaneId> {
    CURRENT_LANE.with(|c| c.get())
}

/// State shared between a pool handle and its lanes
pub(crate) struct Shared<J: Job> {
    pub queue_a: JobQueue<J>,
    pub queue_b: JobQueue<J>,
    pub gate_a: Gate,
    pub gate_b: Gate,
    pub latch: ArmLatch,
    pub token: CancellationToken,
    pub handler: Box<dyn JobHandler<J>>,
    pub counters: Counters,
    pub isolate_faults: bool,
}

impl<J: Job> Shared<J> {
    pub fn new(config: &PoolConfig, handler: Box<dyn JobHandler<J>>) -> Self {
        let t = config.park_timeout;
        Self {
            queue_a: JobQueue::new(t),
            queue_b: JobQueue::new(t),
            gate_a: Gate::new(t),
            gate_b: Gate::new(t),
            latch: ArmLatch::new(t),
            token: CancellationToken::new(),
            handler,
            counters: Counters::default(),
            isolate_faults: config.isolate_faults,
        }
    }

    /// Source gate, source queue, destination queue
    fn route(&self, direction: Direction) -> (&Gate, &JobQueue<J>, &JobQueue<J>) {
        match direction {
            Direction::AtoB => (&self.gate_a, &self.queue_a, &self.queue_b),
            Direction::BtoA => (&self.gate_b, &self.queue_b, &self.queue_a),
        }
    }

    /// Wake everything parked on this pool so it re-checks the token
    pub fn interrupt_all(&self) {
        self.latch.interrupt();
        self.gate_a.interrupt();
        self.gate_b.interrupt();
        self.queue_a.interrupt();
        self.queue_b.interrupt();
    }

    fn claim(&self, gate: &Gate, queue: &JobQueue<J>) -> JobResult<J> {
        let _permit = gate.acquire(&self.token)?;
        queue.dequeue(&self.token)
    }

    fn dispatch(&self, job: &mut J) -> JobResult<bool> {
        match job.phase() {
            Phase::NeedsRead => {
                Counters::bump(&self.counters.reads);
                self.handler.on_read(job)
            }
            Phase::NeedsWrite => {
                Counters::bump(&self.counters.writes);
                self.handler.on_write(job)
            }
            Phase::Idle | Phase::Closed => Ok(true),
        }
    }

    /// Run one routing step; `Some(job)` if it goes back into circulation
    pub fn process(&self, lane: LaneId, mut job: J) -> Option<J> {
        let outcome = if self.isolate_faults {
            catch_unwind(AssertUnwindSafe(|| self.dispatch(&mut job)))
                .unwrap_or(Err(JobError::HandlerPanicked))
        } else {
            self.dispatch(&mut job)
        };

        match outcome {
            Ok(true) if !job.phase().is_terminal() => {
                Counters::bump(&self.counters.forwarded);
                Some(job)
            }
            Ok(_) => {
                Counters::bump(&self.counters.dropped);
                None
            }
            Err(e) => {
                kwarn!("lane {}: job {} dropped after fault: {}", lane, job.id(), e);
                Counters::bump(&self.counters.faults);
                Counters::bump(&self.counters.dropped);
                job.set_phase(Phase::Closed);
                None
            }
        }
    }
}

/// Lane thread body
///
/// Parks until the pool is armed, then bounces jobs until cancellation.
/// Cancellation is the only way out and is not an error.
pub(crate) fn lane_loop<J: Job>(shared: Arc<Shared<J>>, lane: LaneId) {
    CURRENT_LANE.with(|c| c.set(Some(lane)));

    if shared.latch.wait(&shared.token).is_err() {
        ktrace!("lane {} cancelled before arm", lane);
        return;
    }

    let (gate, from, to) = shared.route(lane.direction);
    while let Ok(job) = shared.claim(gate, from) {
        if let Some(job) = shared.process(lane, job) {
            to.enqueue(job);
        }
    }

    ktrace!("lane {} exit", lane);
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobpool_core::{handler_fn, JobId};

    struct Probe {
        phase: Phase,
    }

    impl Job for Probe {
        fn phase(&self) -> Phase {
            self.phase
        }
        fn set_phase(&mut self, phase: Phase) {
            self.phase = phase;
        }
        fn id(&self) -> JobId {
            JobId::from_raw(7)
        }
    }

    const LANE: LaneId = LaneId { pair: 0, direction: Direction::BtoA };

    fn shared_with<H: JobHandler<Probe>>(handler: H) -> Shared<Probe> {
        Shared::new(&PoolConfig::new().worker_pairs(1), Box::new(handler))
    }

    #[test]
    fn test_routing_by_phase() {
        let shared = shared_with(handler_fn(
            |p: &mut Probe| {
                p.set_phase(Phase::NeedsWrite);
                Ok(true)
            },
            |p: &mut Probe| {
                p.set_phase(Phase::Closed);
                Ok(true)
            },
        ));

        let job = shared.process(LANE, Probe { phase: Phase::NeedsRead }).unwrap();
        assert_eq!(job.phase, Phase::NeedsWrite);

        // Closed after the call: dropped even though the handler said true
        assert!(shared.process(LANE, job).is_none());

        // Idle passes through without a handler call
        let idle = shared.process(LANE, Probe { phase: Phase::Idle }).unwrap();
        assert_eq!(idle.phase, Phase::Idle);

        let s = shared.counters.snapshot();
        assert_eq!((s.reads, s.writes, s.forwarded, s.dropped), (1, 1, 2, 1));
    }

    #[test]
    fn test_false_drops_without_closing() {
        let shared = shared_with(handler_fn(|_: &mut Probe| Ok(false), |_: &mut Probe| Ok(true)));
        assert!(shared.process(LANE, Probe { phase: Phase::NeedsRead }).is_none());
        assert_eq!(shared.counters.snapshot().faults, 0);
    }

    #[test]
    fn test_errors_and_panics_are_faults() {
        let shared = shared_with(handler_fn(
            |_: &mut Probe| Err(JobError::Io(std::io::ErrorKind::ConnectionReset.into())),
            |_: &mut Probe| panic!("write handler blew up"),
        ));

        assert!(shared.process(LANE, Probe { phase: Phase::NeedsRead }).is_none());
        assert!(shared.process(LANE, Probe { phase: Phase::NeedsWrite }).is_none());

        let s = shared.counters.snapshot();
        assert_eq!(s.faults, 2);
        assert_eq!(s.dropped, 2);
    }

    #[test]
    fn test_current_lane_outside_pool() {
        assert_eq!(current_lane(), None);
        assert_eq!(LANE.to_string(), "0-b2a");
    }
}
