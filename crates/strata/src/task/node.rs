//! Task identity, state and type-erased node handles

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Unique identifier for a task
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl TaskId {
    /// Generate a new unique TaskId
    pub fn new() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Execution state of a task
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Created, body not started
    Pending,
    /// Body claimed by a thread and executing
    Running,
    /// Resolved with a value
    Succeeded,
    /// Resolved with an error
    Failed,
    /// Given up after a wait from inside its own body (or an ancestor's);
    /// waiting on it, or on anything derived from it, panics
    Abandoned,
}

impl TaskState {
    /// True for `Succeeded`, `Failed` and `Abandoned`
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Abandoned)
    }
}

/// Which operation produced a task's body
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    /// Scheduled directly, no parent
    Root,
    /// Adopted an existing result via `AsyncScheduler::lift`
    Lift,
    /// `then` / `then_run`
    Then,
    /// `then_result`
    ThenResult,
    /// `on_value`
    OnValue,
    /// `catch_error` / `catch_error_silently`
    CatchError,
    /// `catch_error_result`
    CatchErrorResult,
    /// `on_error`
    OnError,
    /// `on_error_result`
    OnErrorResult,
}

/// Operations every task cell supports regardless of its value type
pub(crate) trait Node: Send + Sync {
    fn id(&self) -> TaskId;

    fn kind(&self) -> BodyKind;

    fn state(&self) -> TaskState;

    fn parent_node(&self) -> Option<Arc<dyn Node>>;

    /// Release this handle; if it was the last one, hand back the parent link
    /// instead of dropping it along with the node
    fn into_parent(self: Arc<Self>) -> Option<Arc<dyn Node>>;

    fn child_refs(&self) -> Vec<ChildRef>;

    /// Run the body if unclaimed, otherwise wait for whoever claimed it
    fn execute(&self) -> TaskState;

    /// Resolve unresolved ancestors root-first, then this node
    fn resolve(&self) -> TaskState {
        let state = self.state();
        if state.is_terminal() {
            return state;
        }

        let mut chain = Vec::new();
        let mut cursor = self.parent_node();
        while let Some(node) = cursor {
            if node.state().is_terminal() {
                break;
            }
            cursor = node.parent_node();
            chain.push(node);
        }

        for node in chain.iter().rev() {
            node.execute();
        }
        self.execute()
    }
}

/// Type-erased handle to a task of any value type
///
/// This is what executors receive and what introspection hands out.
#[derive(Clone)]
pub struct TaskRef {
    node: Arc<dyn Node>,
}

impl TaskRef {
    pub(crate) fn new(node: Arc<dyn Node>) -> Self {
        Self { node }
    }

    /// Task identifier
    pub fn id(&self) -> TaskId {
        self.node.id()
    }

    /// Operation that created the task
    pub fn kind(&self) -> BodyKind {
        self.node.kind()
    }

    /// Current state, without resolving
    pub fn state(&self) -> TaskState {
        self.node.state()
    }

    /// Task this one was derived from
    pub fn parent(&self) -> Option<TaskRef> {
        self.node.parent_node().map(TaskRef::new)
    }

    /// Snapshot of derived tasks, in creation order
    pub fn children(&self) -> Vec<ChildRef> {
        self.node.child_refs()
    }

    /// Resolve the task and its ancestors, returning the terminal state
    ///
    /// Blocks while another thread is running any node of the chain.
    pub fn resolve(&self) -> TaskState {
        self.node.resolve()
    }

    /// True if both handles refer to the same task
    pub fn ptr_eq(&self, other: &TaskRef) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }
}

impl fmt::Debug for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRef")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .field("state", &self.state())
            .finish()
    }
}

/// Entry in a task's child list
///
/// Children are held weakly so that a parent does not keep the tasks derived
/// from it alive; the entry itself, with its id and kind, is never removed.
#[derive(Clone)]
pub struct ChildRef {
    id: TaskId,
    kind: BodyKind,
    node: Weak<dyn Node>,
}

impl ChildRef {
    pub(crate) fn new(node: &Arc<dyn Node>) -> Self {
        Self {
            id: node.id(),
            kind: node.kind(),
            node: Arc::downgrade(node),
        }
    }

    /// Child task identifier
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Operation that created the child
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    /// Handle to the child, if it is still alive
    pub fn upgrade(&self) -> Option<TaskRef> {
        self.node.upgrade().map(TaskRef::new)
    }
}

impl fmt::Debug for ChildRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildRef")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
