//! Thread-pool scheduler coordinating worker threads

use crate::scheduler::worker::Worker;
use crate::scheduler::{AsyncScheduler, Executor};
use crate::task::TaskRef;
use crossbeam_deque::{Injector, Steal, Worker as CWorker};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Errors raised while building a thread pool
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The OS refused to start a worker thread
    #[error("failed to spawn worker thread {index}: {source}")]
    WorkerSpawn {
        /// Index of the worker that failed to start
        index: usize,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },
}

/// Thread pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of worker threads (0 = one per CPU core)
    pub worker_count: usize,

    /// Worker threads are named `{prefix}-{index}`
    pub thread_name_prefix: String,

    /// How long an idle worker sleeps before looking for work again
    pub idle_backoff: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            thread_name_prefix: "strata-worker".to_string(),
            idle_backoff: Duration::from_micros(100),
        }
    }
}

impl PoolConfig {
    /// Configuration for a pool with exactly one worker
    pub fn single_worker() -> Self {
        Self::default().with_workers(1)
    }

    /// Set the number of worker threads (0 = one per CPU core)
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the worker thread name prefix
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the idle sleep interval
    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    /// Worker count after resolving 0 to the number of CPU cores
    pub fn effective_workers(&self) -> usize {
        if self.worker_count == 0 {
            num_cpus::get()
        } else {
            self.worker_count
        }
    }
}

/// Queue shared between the scheduler and its workers
pub(crate) struct PoolQueue {
    pub(crate) injector: Injector<TaskRef>,
    pub(crate) shutdown: AtomicBool,
}

impl PoolQueue {
    fn drain(&self) -> usize {
        let mut dropped = 0;
        loop {
            match self.injector.steal() {
                Steal::Success(_) => dropped += 1,
                Steal::Retry => continue,
                Steal::Empty => break,
            }
        }
        dropped
    }
}

impl Executor for PoolQueue {
    fn submit(&self, task: TaskRef) {
        if self.shutdown.load(Ordering::Acquire) {
            tracing::trace!(task = %task.id(), "pool is shut down, task left for on-demand resolution");
            return;
        }
        self.injector.push(task);
    }

    fn name(&self) -> &'static str {
        "thread-pool"
    }
}

/// Scheduler that resolves tasks eagerly on a pool of worker threads
///
/// Every task created on [`scheduler()`](Self::scheduler) is queued as soon
/// as it exists and resolved by whichever worker picks it up. Waiting threads
/// do not idle while work is queued: a waiter that reaches an unclaimed node
/// claims and runs it itself, and only blocks on nodes another thread is
/// already running.
///
/// Dropping the pool shuts it down. Tasks created afterwards, or still queued
/// at shutdown, are not lost; they resolve on the waiting thread like on a
/// manual scheduler.
pub struct ThreadPoolScheduler {
    scheduler: AsyncScheduler,
    queue: Arc<PoolQueue>,
    workers: Vec<Worker>,
    config: PoolConfig,
}

impl ThreadPoolScheduler {
    /// Start a pool with the given configuration
    pub fn new(config: PoolConfig) -> Result<Self, SchedulerError> {
        let worker_count = config.effective_workers();
        let queue = Arc::new(PoolQueue {
            injector: Injector::new(),
            shutdown: AtomicBool::new(false),
        });

        let deques: Vec<CWorker<TaskRef>> = (0..worker_count).map(|_| CWorker::new_lifo()).collect();
        let stealers: Vec<_> = deques.iter().map(CWorker::stealer).collect();

        let mut pool = Self {
            scheduler: AsyncScheduler::new(queue.clone()),
            queue: queue.clone(),
            workers: Vec::with_capacity(worker_count),
            config,
        };

        for (id, local) in deques.into_iter().enumerate() {
            // Stealers from other workers (exclude self)
            let others: Vec<_> = stealers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != id)
                .map(|(_, s)| s.clone())
                .collect();

            let name = format!("{}-{}", pool.config.thread_name_prefix, id);
            match Worker::spawn(id, name, local, others, queue.clone(), pool.config.idle_backoff) {
                Ok(worker) => pool.workers.push(worker),
                Err(source) => {
                    pool.shutdown();
                    return Err(SchedulerError::WorkerSpawn { index: id, source });
                }
            }
        }

        tracing::debug!(workers = worker_count, "thread pool started");
        Ok(pool)
    }

    /// Scheduler whose tasks are executed by this pool
    pub fn scheduler(&self) -> &AsyncScheduler {
        &self.scheduler
    }

    /// Number of worker threads
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Configuration the pool was built with
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// True once `shutdown` has run
    pub fn is_shut_down(&self) -> bool {
        self.queue.shutdown.load(Ordering::Acquire)
    }

    /// Stop and join all workers, dropping queued submissions
    ///
    /// Running bodies finish first. Idempotent.
    pub fn shutdown(&mut self) {
        if self.queue.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        for worker in &mut self.workers {
            worker.join();
        }

        let dropped = self.queue.drain();
        tracing::debug!(dropped, "thread pool shut down");
    }
}

impl Drop for ThreadPoolScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
