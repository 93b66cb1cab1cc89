use super::metrics::Sample;
use super::metrics::Window;
use super::solver::SolverConfig;
use crate::abstraction::Bucketer;
use crate::profile::Store;
use crate::save::checkpoint;
use crate::save::Metadata;
use crate::save::Policy;
use crate::schedule::AdaptiveEpsilon;
use crate::schedule::ScheduleConfig;
use crate::workers::Pool;
use crate::Error;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub iterations: usize,
    pub batch_size: usize,
    pub workers: usize,
    pub checkpoint_interval: usize,
    pub snapshot_interval_secs: u64,
    pub logdir: PathBuf,
    pub seed: u64,
    pub compact: bool,
    pub gzip_json: bool,
    pub solver: SolverConfig,
    pub schedule: ScheduleConfig,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            iterations: 1_000_000,
            batch_size: 256,
            workers: num_cpus::get(),
            checkpoint_interval: 100_000,
            snapshot_interval_secs: 600,
            logdir: PathBuf::from("logdir"),
            seed: 0,
            compact: false,
            gzip_json: true,
            solver: SolverConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

/// the blueprint training driver: owns the canonical store, dispatches
/// batches to the pool, applies the central discount schedule, consults
/// the adaptive epsilon scheduler, and checkpoints.
#[derive(Debug)]
pub struct Trainer {
    config: TrainerConfig,
    bucketer: Arc<Bucketer>,
    store: Store,
    scheduler: AdaptiveEpsilon,
    window: Window,
    iteration: usize,
    elapsed_base: Duration,
    hash: String,
    params: String,
}

impl Trainer {
    pub fn new(bucketer: Arc<Bucketer>, config: TrainerConfig) -> Self {
        let store = if config.compact {
            Store::compact()
        } else {
            Store::dense()
        };
        let scheduler = AdaptiveEpsilon::new(config.schedule.clone());
        let hash = bucketer.hash();
        let params = bucketer.describe();
        Self {
            config,
            bucketer,
            store,
            scheduler,
            window: Window::default(),
            iteration: 0,
            elapsed_base: Duration::ZERO,
            hash,
            params,
        }
    }

    /// pick up the most recent complete checkpoint in the logdir, or
    /// fail explicitly. validation refuses hash and player mismatches
    /// before any state is adopted.
    pub fn resume(bucketer: Arc<Bucketer>, config: TrainerConfig) -> Result<Self, Error> {
        let hash = bucketer.hash();
        let params = bucketer.describe();
        let (store, meta) = checkpoint::resume(
            &config.logdir.join("checkpoints"),
            &hash,
            &params,
            config.solver.players,
        )?;
        let mut scheduler = AdaptiveEpsilon::new(config.schedule.clone());
        scheduler.seek(meta.iteration, meta.epsilon);
        Ok(Self {
            iteration: meta.iteration,
            elapsed_base: Duration::from_secs(meta.elapsed_secs),
            store,
            scheduler,
            window: Window::default(),
            bucketer,
            config,
            hash,
            params,
        })
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }
    pub fn store(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn train(&mut self) -> Result<(), Error> {
        log::info!(
            "training to {} iterations ({} workers, batch {}, backend {})",
            self.config.iterations,
            self.config.workers,
            self.config.batch_size,
            self.store.backend(),
        );
        let mut pool = Pool::new(
            self.config.workers,
            self.bucketer.clone(),
            self.config.solver.clone(),
            self.config.seed,
            self.config.compact,
        );
        let started = Instant::now();
        let mut last_snapshot = Instant::now();
        let mut next_checkpoint = self.iteration + self.config.checkpoint_interval;
        while self.iteration < self.config.iterations {
            let batch = self
                .config
                .batch_size
                .min(self.config.iterations - self.iteration);
            self.discount_milestones(batch);
            let before = self.store.len();
            let began = Instant::now();
            let outcome =
                pool.run_batch(&mut self.store, self.iteration, batch, self.scheduler.current());
            self.iteration += outcome.dispatched;
            self.window.push(Sample {
                iterations: outcome.dispatched,
                discovered: self.store.len() - before,
                elapsed: began.elapsed(),
            });
            self.scheduler
                .decide(self.iteration, self.window.ips(), self.window.growth());
            if self.iteration >= next_checkpoint {
                let elapsed = self.elapsed_base + started.elapsed();
                let dir = self.config.logdir.join("checkpoints");
                self.checkpoint(&dir, elapsed)?;
                pool.sync(self.store.snapshot()?);
                next_checkpoint = self.iteration + self.config.checkpoint_interval;
                log::info!(
                    "iteration {} | {:.1} iters/s | {} infosets | epsilon {}",
                    self.iteration,
                    self.window.ips(),
                    self.store.len(),
                    self.scheduler.current(),
                );
            }
            if last_snapshot.elapsed().as_secs() >= self.config.snapshot_interval_secs {
                let elapsed = self.elapsed_base + started.elapsed();
                let dir = self.config.logdir.join("snapshots");
                self.checkpoint(&dir, elapsed)?;
                last_snapshot = Instant::now();
            }
        }
        let elapsed = self.elapsed_base + started.elapsed();
        let dir = self.config.logdir.join("checkpoints");
        self.checkpoint(&dir, elapsed)?;
        self.export(elapsed)?;
        pool.shutdown();
        Ok(())
    }

    /// the canonical store discounts centrally; workers never do. apply
    /// one multiplication per interval milestone the batch crosses.
    fn discount_milestones(&mut self, batch: usize) {
        let d = self.config.solver.discount;
        let from = self.iteration / d.interval;
        let to = (self.iteration + batch) / d.interval;
        for m in (from + 1)..=to {
            let t = m * d.interval;
            self.store.discount(d.regret_factor(t), d.strategy_factor(t));
        }
    }

    fn metadata(&self, elapsed: Duration) -> Metadata {
        Metadata {
            iteration: self.iteration,
            epsilon: self.scheduler.current(),
            elapsed_secs: elapsed.as_secs(),
            abstraction_hash: self.hash.clone(),
            abstraction_params: self.params.clone(),
            players: self.config.solver.players,
            rng_seed: self.config.seed,
            backend: self.store.backend().to_string(),
            discount: self.config.solver.discount,
        }
    }

    fn checkpoint(&mut self, dir: &Path, elapsed: Duration) -> Result<(), Error> {
        let meta = self.metadata(elapsed);
        checkpoint::save(dir, &mut self.store, &meta, self.config.gzip_json)?;
        Ok(())
    }

    fn export(&mut self, elapsed: Duration) -> Result<(), Error> {
        let meta = self.metadata(elapsed);
        let policy = Policy::from_store(&mut self.store, meta);
        policy.save_json(
            &self.config.logdir.join("policy.json"),
            self.config.gzip_json,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::BucketConfig;
    use crate::profile::Discount;

    fn config(dir: &Path) -> TrainerConfig {
        TrainerConfig {
            iterations: 48,
            batch_size: 16,
            workers: 2,
            checkpoint_interval: 16,
            snapshot_interval_secs: 3600,
            logdir: dir.to_path_buf(),
            seed: 11,
            compact: false,
            gzip_json: false,
            solver: SolverConfig {
                discount: Discount {
                    interval: 16,
                    ..Discount::default()
                },
                ..SolverConfig::default()
            },
            schedule: ScheduleConfig::default(),
        }
    }

    #[test]
    fn trains_checkpoints_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let bucketer = Arc::new(Bucketer::fit(BucketConfig::tiny()));
        let mut trainer = Trainer::new(bucketer.clone(), config(dir.path()));
        trainer.train().unwrap();
        assert_eq!(trainer.iteration(), 48);
        assert!(dir.path().join("policy.json").exists());
        assert!(!checkpoint::complete_checkpoints(&dir.path().join("checkpoints")).is_empty());

        let resumed = Trainer::resume(bucketer, config(dir.path())).unwrap();
        assert_eq!(resumed.iteration(), 48);
    }

    #[test]
    fn resume_without_checkpoints_fails() {
        let dir = tempfile::tempdir().unwrap();
        let bucketer = Arc::new(Bucketer::fit(BucketConfig::tiny()));
        let err = Trainer::resume(bucketer, config(dir.path())).unwrap_err();
        assert!(matches!(err, Error::NoCheckpoint(_)));
    }
}
