//! Memoized task cell: claim, run once, publish

use crate::error::{kinds, ErrorValue, TaskResult};
use crate::outcome::Outcome;
use crate::scheduler::AsyncScheduler;
use crate::task::node::{BodyKind, ChildRef, Node, TaskId, TaskState};
use crossbeam::atomic::AtomicCell;
use parking_lot::{Condvar, Mutex};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// Deferred computation owned by a cell until it is claimed
pub(crate) type Body<T> = Box<dyn FnOnce() -> TaskResult<T> + Send>;

/// Prefix of every re-entrant wait panic message
const REENTRANT_WAIT: &str = "re-entrant wait";

fn is_reentrant_wait(payload: &(dyn Any + Send)) -> bool {
    payload
        .downcast_ref::<String>()
        .map_or(false, |message| message.starts_with(REENTRANT_WAIT))
}

/// Shared state behind every `AsyncTask` handle
pub(crate) struct TaskCell<T> {
    id: TaskId,
    kind: BodyKind,
    scheduler: AsyncScheduler,
    parent: Option<Arc<dyn Node>>,

    /// Pending -> Running is the claim; only the claimant writes the outcome
    state: AtomicCell<TaskState>,

    /// Taken exactly once by the claimant
    body: Mutex<Option<Body<T>>>,

    outcome: Mutex<Outcome<T>>,

    /// Panic message re-raised by every wait once the cell is abandoned
    abandoned: Mutex<Option<String>>,

    /// Signalled once the state becomes terminal
    resolved: Condvar,

    /// Thread currently running the body
    runner: Mutex<Option<ThreadId>>,

    /// Append-only
    children: Mutex<Vec<ChildRef>>,
}

impl<T: Clone + Send + 'static> TaskCell<T> {
    pub(crate) fn new(
        scheduler: AsyncScheduler,
        kind: BodyKind,
        parent: Option<Arc<dyn Node>>,
        body: Body<T>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            kind,
            scheduler,
            parent,
            state: AtomicCell::new(TaskState::Pending),
            body: Mutex::new(Some(body)),
            outcome: Mutex::new(Outcome::Pending),
            abandoned: Mutex::new(None),
            resolved: Condvar::new(),
            runner: Mutex::new(None),
            children: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn scheduler(&self) -> &AsyncScheduler {
        &self.scheduler
    }

    pub(crate) fn push_child(&self, child: ChildRef) {
        self.children.lock().push(child);
    }

    /// Current outcome, without resolving
    pub(crate) fn peek(&self) -> Outcome<T> {
        self.outcome.lock().clone()
    }

    /// Resolve the chain ending here and read the cached result
    ///
    /// Panics, with the original message, if the cell was abandoned.
    pub(crate) fn settle(&self) -> TaskResult<T> {
        self.resolve();

        let abandoned = self.abandoned.lock().clone();
        if let Some(message) = abandoned {
            panic::panic_any(message);
        }

        match &*self.outcome.lock() {
            Outcome::Succeeded(value) => Ok(value.clone()),
            Outcome::Failed(error) => Err(error.clone()),
            Outcome::Pending => Err(ErrorValue::new(
                &kinds::ILLEGAL_STATE,
                format!("{} finished resolving without an outcome", self.id),
            )),
        }
    }

    fn run(&self) -> TaskState {
        *self.runner.lock() = Some(thread::current().id());

        let body = self.body.lock().take();
        let result = match body {
            Some(body) => match panic::catch_unwind(AssertUnwindSafe(body)) {
                Ok(result) => result,
                Err(payload) if is_reentrant_wait(&*payload) => {
                    // Never an outcome: wake other waiters, then keep unwinding
                    if let Some(message) = payload.downcast_ref::<String>() {
                        self.abandon(message.clone());
                    }
                    panic::resume_unwind(payload);
                }
                Err(payload) => {
                    let error = ErrorValue::from_panic(payload);
                    tracing::warn!(task = %self.id, kind = ?self.kind, "task body panicked: {}", error.message());
                    Err(error)
                }
            },
            None => Err(ErrorValue::new(
                &kinds::ILLEGAL_STATE,
                format!("{} has no body to run", self.id),
            )),
        };

        self.publish(result)
    }

    fn publish(&self, result: TaskResult<T>) -> TaskState {
        let state = if result.is_ok() {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        };

        // Counted before waiters can observe the outcome
        self.scheduler.record_executed();
        {
            let mut outcome = self.outcome.lock();
            *outcome = Outcome::from(result);
            self.state.store(state);
        }
        *self.runner.lock() = None;
        self.resolved.notify_all();

        tracing::trace!(task = %self.id, kind = ?self.kind, ?state, "task resolved");
        state
    }

    fn abandon(&self, message: String) {
        tracing::warn!(task = %self.id, kind = ?self.kind, "task abandoned: {}", message);

        *self.abandoned.lock() = Some(message);
        {
            let _outcome = self.outcome.lock();
            self.state.store(TaskState::Abandoned);
        }
        *self.runner.lock() = None;
        self.resolved.notify_all();
    }

    fn wait_terminal(&self) -> TaskState {
        if *self.runner.lock() == Some(thread::current().id()) {
            panic::panic_any(format!(
                "{}: {} was waited on from inside its own body or an ancestor's",
                REENTRANT_WAIT, self.id
            ));
        }

        let mut outcome = self.outcome.lock();
        while !self.state.load().is_terminal() {
            self.resolved.wait(&mut outcome);
        }
        self.state.load()
    }
}

impl<T: Clone + Send + 'static> Node for TaskCell<T> {
    fn id(&self) -> TaskId {
        self.id
    }

    fn kind(&self) -> BodyKind {
        self.kind
    }

    fn state(&self) -> TaskState {
        self.state.load()
    }

    fn parent_node(&self) -> Option<Arc<dyn Node>> {
        self.parent.clone()
    }

    fn into_parent(self: Arc<Self>) -> Option<Arc<dyn Node>> {
        Arc::into_inner(self).and_then(|mut cell| cell.parent.take())
    }

    fn child_refs(&self) -> Vec<ChildRef> {
        self.children.lock().clone()
    }

    fn execute(&self) -> TaskState {
        match self.state.compare_exchange(TaskState::Pending, TaskState::Running) {
            Ok(_) => self.run(),
            Err(TaskState::Running) => self.wait_terminal(),
            Err(state) => state,
        }
    }
}

impl<T> Drop for TaskCell<T> {
    fn drop(&mut self) {
        // Unlink ancestors one at a time so a long chain does not drop recursively
        let mut next = self.parent.take();
        while let Some(node) = next {
            next = node.into_parent();
        }
    }
}
