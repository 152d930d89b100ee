//! Schedulers
//!
//! An [`AsyncScheduler`] creates root tasks and is shared by every task
//! derived from them. How tasks actually get executed is decided by its
//! [`Executor`]:
//!
//! - [`ManualAsyncRunner`] does nothing up front; a body runs on the thread
//!   of the first wait that reaches it.
//! - [`ThreadPoolScheduler`] hands every task to a pool of work-stealing
//!   worker threads, which resolve them eagerly.
//!
//! Both rely on the same claim-and-wait protocol in the task cell, so a task
//! runs exactly once whichever thread gets to it first.

mod manual;
mod pool;
mod worker;

pub use manual::ManualAsyncRunner;
pub use pool::{PoolConfig, SchedulerError, ThreadPoolScheduler};

use crate::error::TaskResult;
use crate::result::AsyncResult;
use crate::task::{AsyncTask, BodyKind, TaskRef, TaskValue};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Execution policy behind an [`AsyncScheduler`]
pub trait Executor: Send + Sync + 'static {
    /// Called once for every task created on the owning scheduler, after the
    /// task has been linked into its parent's child list
    ///
    /// Implementations may run the task (via [`TaskRef::resolve`]) on any
    /// thread at any later point, or never; waiting on a task always
    /// resolves it on demand.
    fn submit(&self, task: TaskRef);

    /// Short name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<E: Executor> Executor for Arc<E> {
    fn submit(&self, task: TaskRef) {
        (**self).submit(task)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks created on this scheduler (roots and derived)
    pub tasks_created: u64,

    /// Task bodies that have run to an outcome
    pub tasks_executed: u64,
}

struct SchedulerShared {
    executor: Box<dyn Executor>,
    tasks_created: AtomicU64,
    tasks_executed: AtomicU64,
}

/// Creates tasks and owns their execution policy
///
/// Cloning is cheap; clones refer to the same scheduler.
#[derive(Clone)]
pub struct AsyncScheduler {
    shared: Arc<SchedulerShared>,
}

impl AsyncScheduler {
    /// Create a scheduler backed by `executor`
    pub fn new(executor: impl Executor) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                executor: Box::new(executor),
                tasks_created: AtomicU64::new(0),
                tasks_executed: AtomicU64::new(0),
            }),
        }
    }

    /// Create a demand-driven scheduler backed by a [`ManualAsyncRunner`]
    pub fn manual() -> Self {
        Self::new(ManualAsyncRunner::new())
    }

    /// Create a task that runs `body` with no parent
    ///
    /// Returns immediately; `body` has not run when this returns.
    pub fn schedule<T, F>(&self, body: F) -> AsyncTask<T>
    where
        T: TaskValue,
        F: FnOnce() -> TaskResult<T> + Send + 'static,
    {
        AsyncTask::root(self, BodyKind::Root, Box::new(body))
    }

    /// Create a task on this scheduler that resolves to `result`
    ///
    /// If `result` is backed by a task, the new task is derived from it (and
    /// listed among its children); otherwise it is a root whose body yields
    /// the already-known outcome.
    pub fn lift<T: TaskValue>(&self, result: AsyncResult<T>) -> AsyncTask<T> {
        match result.as_task() {
            Some(parent) => parent.derive_on(self, BodyKind::Lift, |outcome| outcome),
            None => AsyncTask::root(self, BodyKind::Lift, Box::new(move || result.settle())),
        }
    }

    /// Snapshot of the task counters
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            tasks_created: self.shared.tasks_created.load(Ordering::Relaxed),
            tasks_executed: self.shared.tasks_executed.load(Ordering::Relaxed),
        }
    }

    /// Name of the executor
    pub fn executor_name(&self) -> &'static str {
        self.shared.executor.name()
    }

    /// True if both handles refer to the same scheduler
    pub fn same_as(&self, other: &AsyncScheduler) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn submit(&self, task: TaskRef) {
        self.shared.tasks_created.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(task = %task.id(), kind = ?task.kind(), executor = self.executor_name(), "task created");
        self.shared.executor.submit(task);
    }

    pub(crate) fn record_executed(&self) {
        self.shared.tasks_executed.fetch_add(1, Ordering::Relaxed);
    }
}

impl fmt::Debug for AsyncScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncScheduler")
            .field("executor", &self.executor_name())
            .field("stats", &self.stats())
            .finish()
    }
}
