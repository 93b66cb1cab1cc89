use crate::abstraction::Bucketer;
use crate::mccfr::rng;
use crate::mccfr::solver::Solver;
use crate::mccfr::solver::SolverConfig;
use crate::profile::Deltas;
use crate::profile::Store;
use crate::DRAIN_ATTEMPTS;
use crate::DRAIN_BACKOFF_MS;
use crate::DRAIN_GRACE_MS;
use crate::DRAIN_RECV_MS;
use crate::WORKER_TIMEOUT_SECS;
use crossbeam::channel;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

pub enum Job {
    /// fail-fast startup probe; the worker echoes hello
    Probe,
    /// run a contiguous slice of global iteration indices
    Slice {
        batch: u64,
        start: usize,
        count: usize,
        epsilon: f32,
    },
    /// replace the worker's local store with a snapshot of the main one
    Sync(Vec<u8>),
    Shutdown,
}

pub enum Reply {
    Hello { worker: usize },
    Batch(Report),
}

/// everything a worker sends home after a slice: plain data only
pub struct Report {
    pub worker: usize,
    pub batch: u64,
    pub iterations: usize,
    pub nodes: usize,
    pub deltas: Deltas,
    pub elapsed_ms: u64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BatchOutcome {
    pub dispatched: usize,
    pub reported: usize,
    pub expected: usize,
    pub nodes: usize,
    pub degraded: bool,
}

/// long-lived pool of worker threads. workers own private regret
/// stores; the only traffic is jobs in and delta reports out, so there
/// is no shared mutable state during an iteration.
pub struct Pool {
    jobs: Vec<channel::Sender<Job>>,
    replies: channel::Receiver<Reply>,
    threads: Vec<std::thread::JoinHandle<()>>,
    batches: u64,
}

impl Pool {
    pub fn new(
        n: usize,
        bucketer: Arc<Bucketer>,
        config: SolverConfig,
        base_seed: u64,
        compact: bool,
    ) -> Self {
        assert!(n > 0, "pool needs at least one worker");
        // keep numeric libraries single-threaded inside workers; the
        // parallelism budget belongs to the pool
        for hint in ["OMP_NUM_THREADS", "OPENBLAS_NUM_THREADS", "MKL_NUM_THREADS"] {
            std::env::set_var(hint, "1");
        }
        let (reply_tx, replies) = channel::unbounded();
        let mut jobs = Vec::with_capacity(n);
        let mut threads = Vec::with_capacity(n);
        for worker in 0..n {
            let (job_tx, job_rx) = channel::unbounded();
            let replies = reply_tx.clone();
            let bucketer = bucketer.clone();
            let config = config.clone();
            let stream = rng::stream(base_seed, worker as u64);
            threads.push(
                std::thread::Builder::new()
                    .name(format!("mccfr-worker-{}", worker))
                    .spawn(move || work(worker, job_rx, replies, bucketer, config, stream, compact))
                    .expect("spawn worker thread"),
            );
            jobs.push(job_tx);
        }
        let pool = Self {
            jobs,
            replies,
            threads,
            batches: 0,
        };
        pool.probe();
        pool
    }

    pub fn n(&self) -> usize {
        self.jobs.len()
    }

    /// hello-world probe: fail fast in environments where spawning or
    /// channel plumbing is broken, before any training is attempted
    fn probe(&self) {
        for tx in self.jobs.iter() {
            tx.send(Job::Probe).expect("worker accepts probe");
        }
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut heard = vec![false; self.n()];
        while heard.iter().any(|h| !h) {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .expect("worker pool probe timed out");
            match self.replies.recv_timeout(remaining) {
                Ok(Reply::Hello { worker }) => heard[worker] = true,
                Ok(_) => {}
                Err(e) => panic!("worker pool probe failed: {}", e),
            }
        }
        log::info!("worker pool is live ({} workers)", self.n());
    }

    /// per-worker iteration counts: floor division plus one extra for
    /// the first `batch % n` workers. nobody stalls on truncation, and
    /// the counts always sum to the batch size.
    pub fn split(batch: usize, n: usize) -> Vec<usize> {
        let base = batch / n;
        let extra = batch % n;
        (0..n).map(|w| base + usize::from(w < extra)).collect()
    }

    /// dispatch one batch, drain replies concurrently with the workers
    /// running, and merge deltas into the main store by summation.
    pub fn run_batch(
        &mut self,
        store: &mut Store,
        start: usize,
        batch_size: usize,
        epsilon: f32,
    ) -> BatchOutcome {
        let batch = self.batches;
        self.batches += 1;
        let counts = Self::split(batch_size, self.n());
        let mut outcome = BatchOutcome::default();
        let mut offset = start;
        let mut largest = 0;
        for (worker, count) in counts.into_iter().enumerate() {
            if count == 0 {
                continue;
            }
            self.jobs[worker]
                .send(Job::Slice {
                    batch,
                    start: offset,
                    count,
                    epsilon,
                })
                .expect("worker accepts slice");
            offset += count;
            largest = largest.max(count);
            outcome.dispatched += count;
            outcome.expected += 1;
        }
        // the per-batch deadline is generous and scales with the work
        let deadline = Instant::now()
            + Duration::from_secs(WORKER_TIMEOUT_SECS.max(largest as u64 / 10 + WORKER_TIMEOUT_SECS));
        let mut first = true;
        while outcome.reported < outcome.expected {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            match self.replies.recv_timeout(remaining.min(Duration::from_millis(500))) {
                Ok(Reply::Batch(report)) if report.batch == batch => {
                    if first {
                        // a short grace period lets sibling results land
                        // before we start draining
                        std::thread::sleep(Duration::from_millis(DRAIN_GRACE_MS));
                        first = false;
                    }
                    self.absorb(store, report, &mut outcome);
                    // bounded idle-drain: scoop whatever else is queued
                    // without spinning the kernel
                    let mut attempts = 0;
                    while outcome.reported < outcome.expected && attempts < DRAIN_ATTEMPTS {
                        match self.replies.recv_timeout(Duration::from_millis(DRAIN_RECV_MS)) {
                            Ok(Reply::Batch(report)) if report.batch == batch => {
                                self.absorb(store, report, &mut outcome);
                            }
                            Ok(_) => {}
                            Err(_) => {
                                attempts += 1;
                                std::thread::sleep(Duration::from_millis(DRAIN_BACKOFF_MS));
                            }
                        }
                    }
                }
                Ok(_) => {} // stale reply from a batch that timed out
                Err(channel::RecvTimeoutError::Timeout) => {}
                Err(channel::RecvTimeoutError::Disconnected) => break,
            }
        }
        if outcome.reported < outcome.expected {
            outcome.degraded = true;
            log::warn!(
                "batch {} degraded: {} of {} workers reported before the deadline",
                batch,
                outcome.reported,
                outcome.expected,
            );
        }
        outcome
    }

    fn absorb(&self, store: &mut Store, report: Report, outcome: &mut BatchOutcome) {
        store.merge(&report.deltas);
        outcome.reported += 1;
        outcome.nodes += report.nodes;
        log::debug!(
            "worker {} finished {} iterations in {}ms ({} deltas)",
            report.worker,
            report.iterations,
            report.elapsed_ms,
            report.deltas.len(),
        );
    }

    /// push a snapshot of the main store into every worker so local
    /// strategies stop drifting from the merged truth
    pub fn sync(&self, snapshot: Vec<u8>) {
        for tx in self.jobs.iter() {
            tx.send(Job::Sync(snapshot.clone())).expect("worker accepts sync");
        }
    }

    pub fn shutdown(self) {
        for tx in self.jobs.iter() {
            tx.send(Job::Shutdown).ok();
        }
        for thread in self.threads {
            thread.join().expect("worker thread joins");
        }
    }
}

/// the worker loop: single-threaded MCCFR over a private store
fn work(
    worker: usize,
    jobs: channel::Receiver<Job>,
    replies: channel::Sender<Reply>,
    bucketer: Arc<Bucketer>,
    config: SolverConfig,
    stream: u64,
    compact: bool,
) {
    let mut store = if compact {
        Store::compact()
    } else {
        Store::dense()
    };
    for job in jobs.iter() {
        match job {
            Job::Probe => {
                replies.send(Reply::Hello { worker }).ok();
            }
            Job::Shutdown => break,
            Job::Sync(snapshot) => match Store::restore(&snapshot) {
                Ok(fresh) => store = fresh,
                Err(e) => log::warn!("worker {} failed to sync: {}", worker, e),
            },
            Job::Slice {
                batch,
                start,
                count,
                epsilon,
            } => {
                let began = Instant::now();
                let config = SolverConfig {
                    epsilon,
                    apply_discounts: false,
                    ..config.clone()
                };
                store.begin_deltas();
                let mut nodes = 0;
                {
                    let mut solver = Solver::new(&mut store, &bucketer, &config);
                    for t in start..start + count {
                        let ref mut rng = rng::iteration(stream, t as u64);
                        nodes += solver.iterate(t, rng).nodes;
                    }
                }
                let deltas = store.take_deltas();
                replies
                    .send(Reply::Batch(Report {
                        worker,
                        batch,
                        iterations: count,
                        nodes,
                        deltas,
                        elapsed_ms: began.elapsed().as_millis() as u64,
                    }))
                    .ok();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::BucketConfig;

    /// batch of 100 over 8 workers
    #[test]
    fn split_distributes_the_remainder_first() {
        let counts = Pool::split(100, 8);
        assert_eq!(counts, vec![13, 13, 13, 13, 12, 12, 12, 12]);
        assert_eq!(counts.iter().sum::<usize>(), 100);
    }

    /// more workers than work
    #[test]
    fn split_skips_idle_workers() {
        let counts = Pool::split(100, 128);
        assert_eq!(counts.iter().filter(|&&c| c == 1).count(), 100);
        assert_eq!(counts.iter().filter(|&&c| c == 0).count(), 28);
        assert_eq!(counts.iter().sum::<usize>(), 100);
    }

    #[test]
    fn split_exact_division() {
        assert_eq!(Pool::split(64, 4), vec![16; 4]);
    }

    #[test]
    fn pool_round_trip_merges_deltas() {
        let bucketer = Arc::new(Bucketer::fit(BucketConfig::tiny()));
        let mut pool = Pool::new(2, bucketer, SolverConfig::default(), 7, false);
        let mut store = Store::dense();
        let outcome = pool.run_batch(&mut store, 0, 16, 0.1);
        assert_eq!(outcome.dispatched, 16);
        assert_eq!(outcome.expected, 2);
        assert_eq!(outcome.reported, 2);
        assert!(!outcome.degraded);
        assert!(store.len() > 0, "merged deltas must create infosets");
        pool.shutdown();
    }

    #[test]
    fn sync_replaces_worker_state() {
        let bucketer = Arc::new(Bucketer::fit(BucketConfig::tiny()));
        let mut pool = Pool::new(1, bucketer, SolverConfig::default(), 9, false);
        let mut store = Store::dense();
        pool.run_batch(&mut store, 0, 8, 0.1);
        let snapshot = store.snapshot().unwrap();
        pool.sync(snapshot);
        // the next batch still works after the swap
        let outcome = pool.run_batch(&mut store, 8, 8, 0.1);
        assert_eq!(outcome.reported, 1);
        pool.shutdown();
    }
}
