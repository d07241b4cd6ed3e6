use crate::config::WorkerConfig;
use crate::error::SimError;
use crate::rng::Rng;
use crate::sim::{self, SimInput, SimOutput, TopUpSimOutput, PROGRESS_INTERVAL};
use crate::trial;
use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Trials per shard in the sharded run.
pub const SHARD_SIZE: usize = PROGRESS_INTERVAL;

const DEFAULT_STACK_SIZE: usize = 4 * 1024 * 1024;

pub type SharedProgress<'a> = &'a (dyn Fn(usize, usize) + Sync);

pub struct SimWorker {
    pool: Arc<ThreadPool>,
    num_threads: usize,
}

impl SimWorker {
    /// A pool of `requested_threads`, or sized from the default `WorkerConfig` when 0.
    pub fn new(requested_threads: usize) -> Result<Self, SimError> {
        if requested_threads == 0 {
            return Self::new_with_config(&WorkerConfig::default());
        }
        Self::build_pool(requested_threads, DEFAULT_STACK_SIZE)
    }

    pub fn new_with_config(config: &WorkerConfig) -> Result<Self, SimError> {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let mut num_threads = cores.saturating_sub(config.reserve_cores).max(1);
        if config.max_threads > 0 {
            num_threads = num_threads.min(config.max_threads);
        }
        let stack_size = match config.stack_size_mb {
            0 => DEFAULT_STACK_SIZE,
            mb => mb * 1024 * 1024,
        };
        Self::build_pool(num_threads, stack_size)
    }

    fn build_pool(num_threads: usize, stack_size: usize) -> Result<Self, SimError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("sim-worker-{}", i))
            .stack_size(stack_size)
            .build()
            .map_err(|e| SimError::WorkerPool(e.to_string()))?;

        info!("Worker initialized with {} threads.", num_threads);

        Ok(Self {
            pool: Arc::new(pool),
            num_threads,
        })
    }

    /// Runs `f` on the pool. A panic inside `f` comes back as `SimError::Failed`.
    pub fn execute<F, R>(&self, f: F) -> Result<R, SimError>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let result = self
            .pool
            .install(|| panic::catch_unwind(AssertUnwindSafe(f)));

        result.map_err(|err| {
            let msg = if let Some(s) = err.downcast_ref::<&str>() {
                format!("task panicked: {}", s)
            } else if let Some(s) = err.downcast_ref::<String>() {
                format!("task panicked: {}", s)
            } else {
                "task panicked with unknown error".to_string()
            };
            SimError::Failed(msg)
        })
    }

    pub fn thread_count(&self) -> usize {
        self.num_threads
    }

    /// Splits `total` trials into shards of `SHARD_SIZE`, each with its own
    /// stream seeded from the master stream in shard order, so the outcome for
    /// a seed does not depend on the thread count.
    fn collect_sharded<T, F>(
        &self,
        total: usize,
        seed: Option<&str>,
        on_progress: Option<SharedProgress<'_>>,
        trial: F,
    ) -> Result<Vec<T>, SimError>
    where
        T: Send,
        F: Fn(&mut Rng) -> T + Sync,
    {
        let mut master = Rng::from_optional_seed(seed);
        let shard_count = (total + SHARD_SIZE - 1) / SHARD_SIZE;
        let shard_seeds: Vec<u32> = (0..shard_count).map(|_| master.next_u32()).collect();
        let done = AtomicUsize::new(0);
        debug!("Sharding {} trials into {} shards", total, shard_count);

        self.execute(|| {
            let shards: Vec<Vec<T>> = shard_seeds
                .par_iter()
                .enumerate()
                .map(|(shard_idx, &shard_seed)| {
                    let start = shard_idx * SHARD_SIZE;
                    let end = (start + SHARD_SIZE).min(total);
                    let mut local_rng = Rng::from_state(shard_seed);
                    let results: Vec<T> = (start..end).map(|_| trial(&mut local_rng)).collect();
                    let finished = done.fetch_add(end - start, Ordering::SeqCst) + (end - start);
                    if let Some(cb) = on_progress {
                        cb(finished, total);
                    }
                    results
                })
                .collect();
            shards.into_iter().flatten().collect()
        })
    }

    pub fn run_simulation(
        &self,
        input: &SimInput,
        on_progress: Option<SharedProgress<'_>>,
    ) -> Result<SimOutput, SimError> {
        let plan = input.plan();
        let config = input.strategy();
        info!(
            "Running {} trials with {} on {} threads",
            input.trial_count(),
            config.display_name(),
            self.num_threads
        );
        let results = self.collect_sharded(input.trial_count(), input.seed(), on_progress, |rng| {
            trial::execute_strategy(&config, &plan, rng)
        })?;
        Ok(sim::summarize_simulation(
            input,
            &results,
            sim::run_note("Sharded", input, &config),
        ))
    }

    pub fn run_top_up_simulation(
        &self,
        input: &SimInput,
        on_progress: Option<SharedProgress<'_>>,
    ) -> Result<TopUpSimOutput, SimError> {
        let plan = input.plan();
        let config = input.strategy();
        info!(
            "Running {} top-up trials with {} on {} threads",
            input.trial_count(),
            config.display_name(),
            self.num_threads
        );
        let results = self.collect_sharded(input.trial_count(), input.seed(), on_progress, |rng| {
            trial::execute_top_up(&config, &plan, rng)
        })?;
        Ok(sim::summarize_top_up(
            input,
            &results,
            sim::run_note("Sharded", input, &config),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn input(seed: &str, trials: f64) -> SimInput {
        SimInput {
            trials,
            seed: Some(seed.to_string()),
            ..SimInput::default()
        }
    }

    #[test]
    fn execute_returns_value() {
        let worker = SimWorker::new(2).unwrap();
        assert_eq!(worker.thread_count(), 2);
        assert_eq!(worker.execute(|| 40 + 2).unwrap(), 42);
    }

    #[test]
    fn panic_becomes_failed() {
        let worker = SimWorker::new(1).unwrap();
        let err = worker
            .execute(|| -> u32 { panic!("boom") })
            .unwrap_err();
        match err {
            SimError::Failed(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn zero_threads_sizes_from_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let worker = SimWorker::new(0).unwrap();
        assert_eq!(worker.thread_count(), cores.saturating_sub(1).max(1));
    }

    #[test]
    fn config_caps_threads() {
        let worker = SimWorker::new_with_config(&WorkerConfig {
            max_threads: 1,
            reserve_cores: 0,
            stack_size_mb: 0,
        })
        .unwrap();
        assert_eq!(worker.thread_count(), 1);
    }

    #[test]
    fn sharded_result_does_not_depend_on_thread_count() {
        let input = input("sharded", 1300.0);
        let one = SimWorker::new(1).unwrap().run_simulation(&input, None).unwrap();
        let four = SimWorker::new(4).unwrap().run_simulation(&input, None).unwrap();
        assert_eq!(one.character_distribution, four.character_distribution);
        assert_eq!(one.avg_spent, four.avg_spent);
        assert_eq!(one.p99_spent, four.p99_spent);

        let top_one = SimWorker::new(1).unwrap().run_top_up_simulation(&input, None).unwrap();
        let top_four = SimWorker::new(3).unwrap().run_top_up_simulation(&input, None).unwrap();
        assert_eq!(top_one.top_up_pulls_distribution, top_four.top_up_pulls_distribution);
    }

    #[test]
    fn sharded_progress_reaches_total() {
        let worker = SimWorker::new(2).unwrap();
        let seen = Mutex::new(Vec::new());
        let record = |done: usize, total: usize| seen.lock().unwrap().push((done, total));
        let progress: SharedProgress<'_> = &record;
        worker.run_simulation(&input("progress", 1100.0), Some(progress)).unwrap();
        let mut seen = seen.into_inner().unwrap();
        seen.sort();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.last(), Some(&(1100, 1100)));
    }
}
