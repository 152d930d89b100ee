//! Continuation combinators
//!
//! Each combinator creates a child task, appends it to this task's child
//! list and submits it to the shared scheduler. None of them runs anything
//! at call time.
//!
//! Success-only combinators (`then*`, `on_value`) re-surface a parent failure
//! as the very same error instance. Error-only combinators (`catch_error*`,
//! `on_error*`) fire only when the parent failed with a kind that is, or
//! descends from, the requested kind; otherwise the parent's outcome passes
//! through untouched.

use super::{AsyncTask, BodyKind, TaskValue};
use crate::error::{ErrorKind, ErrorValue, TaskResult};
use crate::result::AsyncResult;

impl<T: TaskValue> AsyncTask<T> {
    /// Run `f` with the parent's value once it succeeds
    pub fn then<U, F>(&self, f: F) -> AsyncTask<U>
    where
        U: TaskValue,
        F: FnOnce(T) -> TaskResult<U> + Send + 'static,
    {
        self.derive(BodyKind::Then, move |parent| f(parent?))
    }

    /// Run `f` once the parent succeeds, ignoring its value
    pub fn then_run<U, F>(&self, f: F) -> AsyncTask<U>
    where
        U: TaskValue,
        F: FnOnce() -> TaskResult<U> + Send + 'static,
    {
        self.derive(BodyKind::Then, move |parent| {
            parent?;
            f()
        })
    }

    /// Run `f` once the parent succeeds and resolve the result it returns
    ///
    /// The returned result, typically another task, is waited on as part of
    /// this node's resolution, so the child's value is the inner value.
    pub fn then_result<U, F>(&self, f: F) -> AsyncTask<U>
    where
        U: TaskValue,
        F: FnOnce(T) -> AsyncResult<U> + Send + 'static,
    {
        self.derive(BodyKind::ThenResult, move |parent| f(parent?).settle())
    }

    /// Observe the parent's value without changing it
    pub fn on_value<F>(&self, f: F) -> AsyncTask<T>
    where
        F: FnOnce(&T) -> TaskResult<()> + Send + 'static,
    {
        self.derive(BodyKind::OnValue, move |parent| {
            let value = parent?;
            f(&value)?;
            Ok(value)
        })
    }

    /// Recover from a failure of `kind`
    ///
    /// The handler's result becomes the child's outcome; returning an error
    /// from it fails the child with that error.
    pub fn catch_error<F>(&self, kind: &'static ErrorKind, handler: F) -> AsyncTask<T>
    where
        F: FnOnce(ErrorValue) -> TaskResult<T> + Send + 'static,
    {
        self.derive(BodyKind::CatchError, move |parent| match parent {
            Err(error) if error.is(kind) => handler(error),
            other => other,
        })
    }

    /// Swallow a failure of `kind`
    ///
    /// Succeeds with `Some(value)` when the parent succeeded and with `None`
    /// when a matching failure was swallowed.
    pub fn catch_error_silently(&self, kind: &'static ErrorKind) -> AsyncTask<Option<T>> {
        self.derive(BodyKind::CatchError, move |parent| match parent {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is(kind) => Ok(None),
            Err(error) => Err(error),
        })
    }

    /// Recover from a failure of `kind` with a result that is itself resolved
    pub fn catch_error_result<F>(&self, kind: &'static ErrorKind, handler: F) -> AsyncTask<T>
    where
        F: FnOnce(ErrorValue) -> AsyncResult<T> + Send + 'static,
    {
        self.derive(BodyKind::CatchErrorResult, move |parent| match parent {
            Err(error) if error.is(kind) => handler(error).settle(),
            other => other,
        })
    }

    /// Observe a failure of `kind`, then treat it as handled
    ///
    /// Succeeds with `Some(value)` when the parent succeeded and with `None`
    /// once the handler has run. An error returned by the handler fails the
    /// child instead.
    pub fn on_error<F>(&self, kind: &'static ErrorKind, handler: F) -> AsyncTask<Option<T>>
    where
        F: FnOnce(&ErrorValue) -> TaskResult<()> + Send + 'static,
    {
        self.derive(BodyKind::OnError, move |parent| match parent {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is(kind) => handler(&error).map(|()| None),
            Err(error) => Err(error),
        })
    }

    /// Like [`on_error`](Self::on_error), with a handler whose result is resolved
    pub fn on_error_result<F>(&self, kind: &'static ErrorKind, handler: F) -> AsyncTask<Option<T>>
    where
        F: FnOnce(&ErrorValue) -> AsyncResult<()> + Send + 'static,
    {
        self.derive(BodyKind::OnErrorResult, move |parent| match parent {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is(kind) => handler(&error).settle().map(|()| None),
            Err(error) => Err(error),
        })
    }
}
