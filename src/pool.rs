//! Bounded worker pool for independent candidate evaluations.
//!
//! The same split-run-reduce shape serves every fan-out in the engine: build a
//! package per work item, run them all to completion on a bounded set of
//! workers, then reduce over the outputs. Packages are mutually independent;
//! each one is processed by exactly one worker and owns its output slots, so
//! the run is lock-free. A package that cannot be evaluated marks itself
//! invalid rather than aborting the pass.

use crate::util::{BlockMatchError, BlockMatchResult};
use rayon::prelude::*;

/// Bounded pool of worker threads with a synchronous barrier `run`.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Builds a pool with up to `workers` concurrent threads (at least one).
    pub fn new(workers: usize) -> BlockMatchResult<Self> {
        let workers = workers.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|err| BlockMatchError::PoolBuild {
                reason: err.to_string(),
            })?;
        Ok(Self { pool, workers })
    }

    /// Returns the configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Processes every package and returns once all output slots are written.
    pub fn run<P, F>(&self, packages: &mut [P], process: F)
    where
        P: Send,
        F: Fn(&mut P) + Sync,
    {
        self.pool
            .install(|| packages.par_iter_mut().for_each(|pkg| process(pkg)));
    }

    /// Maps a compute function over read-only items, collecting the outputs.
    pub fn map<I, O, F>(&self, items: &[I], compute: F) -> Vec<O>
    where
        I: Sync,
        O: Send,
        F: Fn(&I) -> O + Sync,
    {
        self.pool
            .install(|| items.par_iter().map(|item| compute(item)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerPool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Package {
        input: u64,
        output: u64,
        valid: bool,
    }

    #[test]
    fn run_fills_every_output_slot() {
        let pool = WorkerPool::new(4).unwrap();
        let mut packages: Vec<Package> = (0..97)
            .map(|input| Package {
                input,
                output: 0,
                valid: true,
            })
            .collect();
        pool.run(&mut packages, |pkg| {
            pkg.output = pkg.input * pkg.input;
        });
        assert!(packages.iter().all(|p| p.output == p.input * p.input));
    }

    #[test]
    fn one_invalid_package_does_not_poison_the_rest() {
        let pool = WorkerPool::new(3).unwrap();
        let mut packages: Vec<Package> = (0..32)
            .map(|input| Package {
                input,
                output: 0,
                valid: true,
            })
            .collect();
        pool.run(&mut packages, |pkg| {
            if pkg.input == 13 {
                pkg.valid = false;
            } else {
                pkg.output = pkg.input + 1;
            }
        });
        assert_eq!(packages.iter().filter(|p| !p.valid).count(), 1);
        assert!(packages
            .iter()
            .filter(|p| p.valid)
            .all(|p| p.output == p.input + 1));
    }

    #[test]
    fn worker_count_is_bounded() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.workers(), 2);
        let live = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let items: Vec<u32> = (0..64).collect();
        let out = pool.map(&items, |&i| {
            let now = live.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_micros(200));
            live.fetch_sub(1, Ordering::SeqCst);
            i * 2
        });
        assert_eq!(out.len(), 64);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn zero_workers_clamps_to_one() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.workers(), 1);
    }
}
