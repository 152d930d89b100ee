//! Per-node outcome state

use crate::error::{ErrorValue, TaskResult};

/// State of a single task's result
///
/// Moves from `Pending` to one of the terminal variants exactly once.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Not resolved yet
    Pending,
    /// Resolved with a value
    Succeeded(T),
    /// Resolved with an error
    Failed(ErrorValue),
}

impl<T> Outcome<T> {
    /// True while unresolved
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// True once resolved either way
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    /// True if resolved with a value
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// True if resolved with an error
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The value, if succeeded
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    /// The error, if failed
    pub fn error(&self) -> Option<&ErrorValue> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Borrow the value in place
    pub fn as_ref(&self) -> Outcome<&T> {
        match self {
            Self::Pending => Outcome::Pending,
            Self::Succeeded(value) => Outcome::Succeeded(value),
            Self::Failed(error) => Outcome::Failed(error.clone()),
        }
    }

    /// Convert a terminal outcome into a `Result`; `None` while pending
    pub fn into_result(self) -> Option<TaskResult<T>> {
        match self {
            Self::Pending => None,
            Self::Succeeded(value) => Some(Ok(value)),
            Self::Failed(error) => Some(Err(error)),
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> From<TaskResult<T>> for Outcome<T> {
    fn from(result: TaskResult<T>) -> Self {
        match result {
            Ok(value) => Self::Succeeded(value),
            Err(error) => Self::Failed(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::kinds;

    #[test]
    fn test_default_is_pending() {
        let outcome: Outcome<i32> = Outcome::default();
        assert!(outcome.is_pending());
        assert!(!outcome.is_terminal());
        assert!(outcome.into_result().is_none());
    }

    #[test]
    fn test_succeeded() {
        let outcome = Outcome::from(Ok::<_, ErrorValue>(42));
        assert!(outcome.is_succeeded());
        assert_eq!(outcome.value(), Some(&42));
        assert!(outcome.error().is_none());
        assert_eq!(outcome.into_result().unwrap().unwrap(), 42);
    }

    #[test]
    fn test_failed_keeps_instance() {
        let err = ErrorValue::new(&kinds::RUNTIME, "boom");
        let outcome: Outcome<i32> = Outcome::from(Err(err.clone()));
        assert!(outcome.is_failed());
        assert!(outcome.error().unwrap().same_instance(&err));
        assert!(outcome.as_ref().error().unwrap().same_instance(&err));
    }
}
