//! Demand-driven reference executor

use crate::scheduler::Executor;
use crate::task::TaskRef;

/// Single-threaded, demand-driven executor
///
/// Submitting a task does nothing. All work happens synchronously inside
/// `wait()`: the waiting thread walks the unresolved ancestors root-first,
/// runs each body exactly once, then evaluates the requested task. Tasks that
/// are never waited on (directly or through a descendant) never run.
///
/// [`AsyncScheduler::manual`](crate::AsyncScheduler::manual) builds a scheduler around one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualAsyncRunner;

impl ManualAsyncRunner {
    /// Create a new runner
    pub fn new() -> Self {
        ManualAsyncRunner
    }
}

impl Executor for ManualAsyncRunner {
    fn submit(&self, task: TaskRef) {
        tracing::trace!(task = %task.id(), "deferred until first wait");
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}
