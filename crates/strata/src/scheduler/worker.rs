//! Worker thread that resolves submitted tasks

use crate::scheduler::pool::PoolQueue;
use crate::task::TaskRef;
use crossbeam_deque::{Injector, Steal, Stealer, Worker as CWorker};
use rand::Rng;
use std::io;
use std::iter;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Worker thread that resolves tasks from the pool
pub(crate) struct Worker {
    /// Worker ID
    id: usize,

    /// Worker thread handle
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker thread
    pub(crate) fn spawn(
        id: usize,
        name: String,
        local: CWorker<TaskRef>,
        stealers: Vec<Stealer<TaskRef>>,
        queue: Arc<PoolQueue>,
        idle_backoff: Duration,
    ) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || Worker::run_loop(id, local, stealers, queue, idle_backoff))?;

        Ok(Self {
            id,
            handle: Some(handle),
        })
    }

    /// Wait for the worker thread to exit
    pub(crate) fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!(worker = self.id, "worker thread exited by panic");
            }
        }
    }

    /// Worker thread main loop
    fn run_loop(
        id: usize,
        local: CWorker<TaskRef>,
        stealers: Vec<Stealer<TaskRef>>,
        queue: Arc<PoolQueue>,
        idle_backoff: Duration,
    ) {
        tracing::debug!(worker = id, "worker started");

        loop {
            if queue.shutdown.load(Ordering::Acquire) {
                break;
            }

            let task = match Self::find_work(&local, &stealers, &queue.injector) {
                Some(task) => task,
                None => {
                    thread::sleep(idle_backoff);
                    continue;
                }
            };

            // Bodies are already guarded; this only catches precondition panics
            match panic::catch_unwind(AssertUnwindSafe(|| task.resolve())) {
                Ok(state) => {
                    tracing::trace!(worker = id, task = %task.id(), ?state, "worker resolved task");
                }
                Err(_) => {
                    tracing::warn!(worker = id, task = %task.id(), "task resolution panicked");
                }
            }
        }

        tracing::debug!(worker = id, "worker shutting down");
    }

    /// Find work: local pop, then a batch from the global injector, then a
    /// batch from another worker, starting at a random victim
    fn find_work(
        local: &CWorker<TaskRef>,
        stealers: &[Stealer<TaskRef>],
        injector: &Injector<TaskRef>,
    ) -> Option<TaskRef> {
        if let Some(task) = local.pop() {
            return Some(task);
        }

        let start = if stealers.is_empty() {
            0
        } else {
            rand::thread_rng().gen_range(0..stealers.len())
        };
        let victims = stealers.iter().cycle().skip(start).take(stealers.len());

        // Retry only while some source reported contention
        iter::repeat_with(|| {
            injector.steal_batch_and_pop(local).or_else(|| {
                victims
                    .clone()
                    .map(|stealer| stealer.steal_batch_and_pop(local))
                    .collect::<Steal<TaskRef>>()
            })
        })
        .find(|steal| !steal.is_retry())
        .and_then(Steal::success)
    }
}
