//! Thread budget for parallel sweeps.

use std::num::NonZeroUsize;

use rayon::ThreadPoolBuilder;
use tracing::warn;

/// How many Rayon threads a sweep may use. `None` means the global pool (every core).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    threads: Option<NonZeroUsize>,
}

impl WorkerPool {
    pub fn default_workers() -> Self {
        Self::default()
    }

    /// `0` selects the global pool.
    pub fn with_workers(count: usize) -> Self {
        Self {
            threads: NonZeroUsize::new(count),
        }
    }

    pub fn threads(&self) -> Option<NonZeroUsize> {
        self.threads
    }

    /// Runs `job` inside a dedicated pool of [Self::threads] threads, or on the global pool.
    /// A pool that fails to build is logged and the job runs on the global pool instead.
    pub fn install<F, R>(&self, job: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let Some(threads) = self.threads else {
            return job();
        };
        match ThreadPoolBuilder::new().num_threads(threads.get()).build() {
            Ok(pool) => pool.install(job),
            Err(err) => {
                warn!(threads = threads.get(), %err, "could not build sweep pool; using global pool");
                job()
            }
        }
    }
}
