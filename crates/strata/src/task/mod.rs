//! Lazily resolved tasks
//!
//! An [`AsyncTask`] is a handle to a shared cell holding a deferred body and
//! the outcome it produced. The body runs at most once: the first wait that
//! reaches the cell (or a pool worker, on a threaded scheduler) claims it,
//! runs it after every unresolved ancestor, and caches the outcome for all
//! later observers.

mod cell;
mod combinators;
mod node;

pub use node::{BodyKind, ChildRef, TaskId, TaskRef, TaskState};

pub(crate) use cell::Body;
pub(crate) use node::Node;

use crate::error::{kinds, ErrorKind, ErrorValue, TaskResult};
use crate::outcome::Outcome;
use crate::scheduler::AsyncScheduler;
use cell::TaskCell;
use std::fmt;
use std::sync::Arc;

/// Bounds shared by every value a task can produce
pub trait TaskValue: Clone + Send + 'static {}

impl<T: Clone + Send + 'static> TaskValue for T {}

/// A result produced lazily by running a body, optionally after a parent
pub struct AsyncTask<T> {
    cell: Arc<TaskCell<T>>,
}

impl<T: TaskValue> AsyncTask<T> {
    /// Create a parentless task and hand it to the scheduler's executor
    pub(crate) fn root(scheduler: &AsyncScheduler, kind: BodyKind, body: Body<T>) -> Self {
        let task = Self {
            cell: Arc::new(TaskCell::new(scheduler.clone(), kind, None, body)),
        };
        scheduler.submit(task.task_ref());
        task
    }

    /// Derive a child on this task's scheduler
    pub(crate) fn derive<U, F>(&self, kind: BodyKind, body: F) -> AsyncTask<U>
    where
        U: TaskValue,
        F: FnOnce(TaskResult<T>) -> TaskResult<U> + Send + 'static,
    {
        self.derive_on(self.cell.scheduler(), kind, body)
    }

    /// Derive a child that evaluates `body` against this task's final result
    pub(crate) fn derive_on<U, F>(&self, scheduler: &AsyncScheduler, kind: BodyKind, body: F) -> AsyncTask<U>
    where
        U: TaskValue,
        F: FnOnce(TaskResult<T>) -> TaskResult<U> + Send + 'static,
    {
        // The child's parent link keeps the parent alive; the body only needs
        // to reach it while the child runs
        let parent = Arc::downgrade(&self.cell);
        let child = AsyncTask {
            cell: Arc::new(TaskCell::new(
                scheduler.clone(),
                kind,
                Some(self.node()),
                Box::new(move || match parent.upgrade() {
                    Some(parent) => body(parent.settle()),
                    None => Err(ErrorValue::new(
                        &kinds::ILLEGAL_STATE,
                        "parent task dropped before its child ran",
                    )),
                }),
            )),
        };

        self.cell.push_child(ChildRef::new(&child.node()));
        scheduler.submit(child.task_ref());
        child
    }

    fn node(&self) -> Arc<dyn Node> {
        self.cell.clone()
    }

    /// Type-erased handle to this task
    pub fn task_ref(&self) -> TaskRef {
        TaskRef::new(self.node())
    }

    /// Task identifier
    pub fn id(&self) -> TaskId {
        self.cell.id()
    }

    /// Operation that created this task
    pub fn kind(&self) -> BodyKind {
        self.cell.kind()
    }

    /// Current state, without resolving
    pub fn state(&self) -> TaskState {
        self.cell.state()
    }

    /// True once the outcome is cached (or the task was abandoned)
    pub fn is_resolved(&self) -> bool {
        self.state().is_terminal()
    }

    /// Scheduler this task was created on
    pub fn scheduler(&self) -> &AsyncScheduler {
        self.cell.scheduler()
    }

    /// Task this one was derived from, if any
    pub fn parent(&self) -> Option<TaskRef> {
        self.cell.parent_node().map(TaskRef::new)
    }

    /// Snapshot of the tasks derived from this one, in creation order
    pub fn children(&self) -> Vec<ChildRef> {
        self.cell.child_refs()
    }

    /// Current outcome, without resolving
    pub fn peek(&self) -> Outcome<T> {
        self.cell.peek()
    }

    /// Resolve and return the raw outcome; errors are never wrapped
    pub fn outcome(&self) -> Outcome<T> {
        Outcome::from(self.settle())
    }

    /// Resolve and return the value
    ///
    /// Failures surface wrapped in an `AwaitException` unless they already are
    /// one; see [`wait_expecting`](Self::wait_expecting).
    pub fn wait(&self) -> TaskResult<T> {
        self.wait_expecting(&kinds::AWAIT)
    }

    /// Resolve and return the value, passing matching failures through
    ///
    /// A failure whose kind is `expected` (or descends from it) is returned
    /// unchanged; any other failure is wrapped in an `AwaitException` whose
    /// cause is the original error.
    ///
    /// # Panics
    ///
    /// Panics if called from inside the body of this task or of one of its
    /// ancestors, which could never complete. The task is then abandoned:
    /// every later wait on it, or on a task derived from it, panics too.
    pub fn wait_expecting(&self, expected: &ErrorKind) -> TaskResult<T> {
        self.settle().map_err(|error| error.surface_as(expected))
    }

    pub(crate) fn settle(&self) -> TaskResult<T> {
        self.cell.settle()
    }

    /// True if both handles refer to the same task
    pub fn ptr_eq(&self, other: &AsyncTask<T>) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T> Clone for AsyncTask<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: TaskValue> fmt::Debug for AsyncTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTask")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("state", &self.state())
            .finish()
    }
}
