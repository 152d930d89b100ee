//! Error kinds with single-inheritance matching

use std::fmt;
use std::ptr;

/// Runtime classification of an [`ErrorValue`](super::ErrorValue)
///
/// Kinds form a single-inheritance tree: every kind except a root names
/// exactly one parent. Identity is the address of the kind, so kinds must be
/// declared as `static` items and passed around as `&'static ErrorKind`:
///
/// ```ignore
/// static FILE_NOT_FOUND: ErrorKind = ErrorKind::extends("FileNotFound", &kinds::NOT_FOUND);
/// ```
pub struct ErrorKind {
    name: &'static str,
    parent: Option<&'static ErrorKind>,
}

impl ErrorKind {
    /// Create a kind with no parent
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Create a kind that descends from `parent`
    pub const fn extends(name: &'static str, parent: &'static ErrorKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// Human-readable name of the kind
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Direct parent, if any
    pub fn parent(&self) -> Option<&'static ErrorKind> {
        self.parent
    }

    /// True if `self` is `ancestor` or descends from it
    pub fn is_a(&self, ancestor: &ErrorKind) -> bool {
        self.ancestors().any(|kind| ptr::eq(kind, ancestor))
    }

    /// Iterate over this kind followed by each of its ancestors, nearest first
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: Some(self),
        }
    }

    /// Number of ancestors above this kind (0 for a root)
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

impl Eq for ErrorKind {}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorKind({})", self.name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator returned by [`ErrorKind::ancestors`]
pub struct Ancestors<'a> {
    next: Option<&'a ErrorKind>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a ErrorKind;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

/// Built-in kinds
///
/// ```text
/// Error
/// ├── RuntimeFailure
/// │   ├── AwaitException
/// │   ├── IllegalArgument
/// │   ├── IllegalState
/// │   ├── NotFound
/// │   └── Unsupported
/// └── Panic
/// ```
pub mod kinds {
    use super::ErrorKind;

    /// Root of the built-in hierarchy
    pub static ERROR: ErrorKind = ErrorKind::root("Error");

    /// General failure raised by task bodies
    pub static RUNTIME: ErrorKind = ErrorKind::extends("RuntimeFailure", &ERROR);

    /// Wrapper surfaced by `wait()` when the failure was not anticipated
    pub static AWAIT: ErrorKind = ErrorKind::extends("AwaitException", &RUNTIME);

    /// A value handed to a body was rejected
    pub static ILLEGAL_ARGUMENT: ErrorKind = ErrorKind::extends("IllegalArgument", &RUNTIME);

    /// An operation ran in a state that does not permit it
    pub static ILLEGAL_STATE: ErrorKind = ErrorKind::extends("IllegalState", &RUNTIME);

    /// A looked-up entity does not exist
    pub static NOT_FOUND: ErrorKind = ErrorKind::extends("NotFound", &RUNTIME);

    /// The requested operation is not supported
    pub static UNSUPPORTED: ErrorKind = ErrorKind::extends("Unsupported", &RUNTIME);

    /// A body or handler panicked
    pub static PANIC: ErrorKind = ErrorKind::extends("Panic", &ERROR);
}
