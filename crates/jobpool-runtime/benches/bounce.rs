//! Submit-to-drop latency of jobs bouncing through a pool

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use jobpool_core::{Job, JobResult, Phase};
use jobpool_runtime::{JobPool, PoolConfig};

const BATCH: usize = 256;

struct Hop {
    phase: Phase,
    left: u32,
}

impl Job for Hop {
    fn phase(&self) -> Phase {
        self.phase
    }
    fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }
}

fn step(hop: &mut Hop, next: Phase, done: &AtomicUsize) -> JobResult<bool> {
    hop.left -= 1;
    if hop.left == 0 {
        hop.set_phase(Phase::Closed);
        done.fetch_add(1, Ordering::Release);
    } else {
        hop.set_phase(next);
    }
    Ok(true)
}

fn bench_bounce(c: &mut Criterion) {
    let mut group = c.benchmark_group("bounce");
    group.throughput(Throughput::Elements(BATCH as u64));

    for pairs in [1usize, 2, 4] {
        let done = Arc::new(AtomicUsize::new(0));
        let (r, w) = (Arc::clone(&done), Arc::clone(&done));
        let pool = Arc::new(
            JobPool::from_fns(
                PoolConfig::new().worker_pairs(pairs).lane_name("bench"),
                move |h: &mut Hop| step(h, Phase::NeedsWrite, &r),
                move |h: &mut Hop| step(h, Phase::NeedsRead, &w),
            )
            .unwrap(),
        );
        let runner = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.run())
        };
        while !pool.is_armed() {
            thread::sleep(Duration::from_millis(1));
        }

        group.bench_with_input(BenchmarkId::new("pairs", pairs), &pairs, |b, _| {
            b.iter(|| {
                let target = done.load(Ordering::Acquire) + BATCH;
                for _ in 0..BATCH {
                    pool.submit(Hop { phase: Phase::NeedsRead, left: 8 });
                }
                while done.load(Ordering::Acquire) < target {
                    std::hint::spin_loop();
                }
            })
        });

        pool.close();
        runner.join().unwrap().unwrap();
    }

    group.finish();
}

criterion_group!(benches, bench_bounce);
criterion_main!(benches);
