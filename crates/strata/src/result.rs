//! Values that are known now or will be known later

use crate::error::{kinds, ErrorKind, ErrorValue, TaskResult};
use crate::outcome::Outcome;
use crate::task::{AsyncTask, TaskValue};
use std::fmt;

/// A success or failure that is either already known or produced by a task
///
/// Waiting on a resolved result returns immediately. Waiting on a
/// task-backed result resolves the task (and its ancestors) first.
///
/// `AsyncResult` has no combinators of its own. To chain off one, adopt it
/// into a scheduler with [`AsyncScheduler::lift`], which returns an
/// [`AsyncTask`] (derived from the backing task, if there is one):
///
/// ```ignore
/// let scheduler = AsyncScheduler::manual();
/// let doubled = scheduler.lift(AsyncResult::success(21)).then(|v| Ok(v * 2));
/// assert_eq!(doubled.wait()?, 42);
/// ```
///
/// [`AsyncScheduler::lift`]: crate::AsyncScheduler::lift
#[derive(Clone)]
pub struct AsyncResult<T> {
    repr: Repr<T>,
}

#[derive(Clone)]
enum Repr<T> {
    Ready(TaskResult<T>),
    Task(AsyncTask<T>),
}

impl<T: TaskValue> AsyncResult<T> {
    /// An already-succeeded result
    pub fn success(value: T) -> Self {
        Self {
            repr: Repr::Ready(Ok(value)),
        }
    }

    /// An already-failed result
    pub fn error(error: ErrorValue) -> Self {
        Self {
            repr: Repr::Ready(Err(error)),
        }
    }

    /// True if waiting would not run anything
    pub fn is_resolved(&self) -> bool {
        match &self.repr {
            Repr::Ready(_) => true,
            Repr::Task(task) => task.is_resolved(),
        }
    }

    /// The backing task, if any
    pub fn as_task(&self) -> Option<&AsyncTask<T>> {
        match &self.repr {
            Repr::Ready(_) => None,
            Repr::Task(task) => Some(task),
        }
    }

    /// Current outcome, without resolving
    pub fn peek(&self) -> Outcome<T> {
        match &self.repr {
            Repr::Ready(result) => Outcome::from(result.clone()),
            Repr::Task(task) => task.peek(),
        }
    }

    /// Resolve and return the raw outcome; errors are never wrapped
    pub fn outcome(&self) -> Outcome<T> {
        Outcome::from(self.settle())
    }

    /// Resolve and return the value, wrapping failures in an `AwaitException`
    pub fn wait(&self) -> TaskResult<T> {
        self.wait_expecting(&kinds::AWAIT)
    }

    /// Resolve and return the value, passing failures of `expected` through
    pub fn wait_expecting(&self, expected: &ErrorKind) -> TaskResult<T> {
        self.settle().map_err(|error| error.surface_as(expected))
    }

    pub(crate) fn settle(&self) -> TaskResult<T> {
        match &self.repr {
            Repr::Ready(result) => result.clone(),
            Repr::Task(task) => task.settle(),
        }
    }
}

impl AsyncResult<()> {
    /// An already-succeeded result with no value
    pub fn done() -> Self {
        Self::success(())
    }
}

impl<T: TaskValue + fmt::Debug> fmt::Debug for AsyncResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Ready(result) => f.debug_tuple("AsyncResult::Ready").field(result).finish(),
            Repr::Task(task) => f.debug_tuple("AsyncResult::Task").field(task).finish(),
        }
    }
}

impl<T> From<AsyncTask<T>> for AsyncResult<T> {
    fn from(task: AsyncTask<T>) -> Self {
        Self {
            repr: Repr::Task(task),
        }
    }
}

impl<T> From<TaskResult<T>> for AsyncResult<T> {
    fn from(result: TaskResult<T>) -> Self {
        Self {
            repr: Repr::Ready(result),
        }
    }
}
