//! Unbounded job queue
//!
//! Lock-free MPMC FIFO with a cancellable blocking dequeue. Enqueue never
//! blocks and never fails; there is no capacity limit and no backpressure.

use std::time::Duration;

use crossbeam_queue::SegQueue;
use jobpool_core::{CancellationToken, JobResult};

use crate::parking::{Parking, PlatformParking};

/// One of the two hand-off queues of a pool
pub struct JobQueue<J> {
    items: SegQueue<J>,
    parking: PlatformParking,
    park_timeout: Duration,
}

impl<J> JobQueue<J> {
    pub fn new(park_timeout: Duration) -> Self {
        Self {
            items: SegQueue::new(),
            parking: PlatformParking::new(),
            park_timeout,
        }
    }

    /// Append a job and wake one waiting consumer
    pub fn enqueue(&self, job: J) {
        self.items.push(job);
        self.parking.unpark_one();
    }

    /// Pop the oldest job, blocking while the queue is empty
    ///
    /// Fails with `Cancelled` once `token` is raised, even if items remain.
    pub fn dequeue(&self, token: &CancellationToken) -> JobResult<J> {
        loop {
            token.check()?;
            if let Some(job) = self.items.pop() {
                return Ok(job);
            }

            let key = self.parking.prepare();
            token.check()?;
            if let Some(job) = self.items.pop() {
                return Ok(job);
            }
            self.parking.park(key, Some(self.park_timeout));
        }
    }

    /// Wake every consumer parked on this queue so it re-checks its token
    pub fn interrupt(&self) {
        self.parking.unpark_all();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobpool_core::JobError;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_fifo() {
        let q = JobQueue::new(Duration::from_millis(100));
        let token = CancellationToken::new();
        for i in 0..10 {
            q.enqueue(i);
        }
        assert_eq!(q.len(), 10);

        let drained: Vec<i32> = (0..10).map(|_| q.dequeue(&token).unwrap()).collect();
        assert_eq!(drained, (0..10).collect::<Vec<_>>());
        assert!(q.is_empty());
    }

    #[test]
    fn test_dequeue_waits_for_enqueue() {
        let q = Arc::new(JobQueue::new(Duration::from_secs(10)));
        let token = CancellationToken::new();

        let consumer = {
            let q = Arc::clone(&q);
            let token = token.clone();
            thread::spawn(move || q.dequeue(&token))
        };

        thread::sleep(Duration::from_millis(20));
        let start = Instant::now();
        q.enqueue("late");

        assert_eq!(consumer.join().unwrap().unwrap(), "late");
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancelled_dequeue_leaves_items() {
        let q = JobQueue::new(Duration::from_millis(100));
        let token = CancellationToken::new();
        q.enqueue(1u8);

        token.cancel();
        assert!(matches!(q.dequeue(&token), Err(JobError::Cancelled)));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_cancel_unblocks_empty_dequeue() {
        let q = Arc::new(JobQueue::<u8>::new(Duration::from_secs(10)));
        let token = CancellationToken::new();

        let consumer = {
            let q = Arc::clone(&q);
            let token = token.clone();
            thread::spawn(move || q.dequeue(&token))
        };

        thread::sleep(Duration::from_millis(20));
        token.cancel();
        q.interrupt();
        assert!(matches!(consumer.join().unwrap(), Err(JobError::Cancelled)));
    }
}
