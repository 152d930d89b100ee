//! Shared error values carried through task outcomes

use super::kind::{kinds, ErrorKind};
use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// An error with a runtime kind, a message and an optional cause
///
/// `ErrorValue` is a cheap handle: clones refer to the same underlying
/// instance, which is how a failure re-surfaced through several nodes of a
/// chain can be recognised as the original (see [`ErrorValue::same_instance`]).
#[derive(Clone)]
pub struct ErrorValue {
    inner: Arc<ErrorInner>,
}

struct ErrorInner {
    kind: &'static ErrorKind,
    message: String,
    cause: Option<ErrorValue>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ErrorValue {
    /// Create an error of `kind`
    pub fn new(kind: &'static ErrorKind, message: impl Into<String>) -> Self {
        Self::build(kind, message.into(), None, None)
    }

    /// Create an error of `kind` caused by `cause`
    pub fn with_cause(kind: &'static ErrorKind, message: impl Into<String>, cause: ErrorValue) -> Self {
        Self::build(kind, message.into(), Some(cause), None)
    }

    /// Classify a foreign error as `kind`, keeping it as the source
    pub fn from_error<E>(kind: &'static ErrorKind, error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::build(kind, error.to_string(), None, Some(Box::new(error)))
    }

    /// Wrap `cause` in an `AwaitException`
    pub fn await_failure(cause: ErrorValue) -> Self {
        let message = format!("awaited task failed with {}", cause);
        Self::with_cause(&kinds::AWAIT, message, cause)
    }

    /// Convert a caught panic payload into a `Panic` error
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(&kinds::PANIC, message)
    }

    fn build(
        kind: &'static ErrorKind,
        message: String,
        cause: Option<ErrorValue>,
        source: Option<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            inner: Arc::new(ErrorInner {
                kind,
                message,
                cause,
                source,
            }),
        }
    }

    /// Runtime kind of this error
    pub fn kind(&self) -> &'static ErrorKind {
        self.inner.kind
    }

    /// Error message, without the kind prefix
    pub fn message(&self) -> &str {
        &self.inner.message
    }

    /// Direct cause, if any
    pub fn cause(&self) -> Option<&ErrorValue> {
        self.inner.cause.as_ref()
    }

    /// Innermost error of the cause chain (`self` when there is no cause)
    pub fn root_cause(&self) -> &ErrorValue {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    /// True if this error's kind is `kind` or descends from it
    pub fn is(&self, kind: &ErrorKind) -> bool {
        self.inner.kind.is_a(kind)
    }

    /// True if both handles refer to the same error instance
    pub fn same_instance(&self, other: &ErrorValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Shape this error for delivery at a wait boundary
    ///
    /// Returned unchanged when it matches `expected`, otherwise wrapped in an
    /// `AwaitException` carrying it as the cause.
    pub(crate) fn surface_as(self, expected: &ErrorKind) -> Self {
        if self.is(expected) {
            self
        } else {
            Self::await_failure(self)
        }
    }
}

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorValue")
            .field("kind", &self.inner.kind.name())
            .field("message", &self.inner.message)
            .field("cause", &self.inner.cause)
            .finish()
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.inner.kind, self.inner.message)
    }
}

impl StdError for ErrorValue {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        if let Some(cause) = &self.inner.cause {
            return Some(cause);
        }
        self.inner
            .source
            .as_deref()
            .map(|source| source as &(dyn StdError + 'static))
    }
}
