//! Strata: lazy asynchronous results and continuation chains
//!
//! This crate provides:
//! - [`AsyncResult`], a success or failure that is known now or later
//! - [`AsyncTask`], a lazily resolved, memoized computation chained off a parent
//! - continuation combinators (`then`, `catch_error`, `on_error`, ...) with
//!   hierarchy-aware error matching over [`ErrorKind`]
//! - [`AsyncScheduler`] with a demand-driven [`ManualAsyncRunner`] and a
//!   work-stealing [`ThreadPoolScheduler`]
//!
//! Every task body runs at most once, after all of its ancestors, no matter
//! which node of a chain is waited on first or how many threads wait on it.
//!
//! ```ignore
//! use strata::{kinds, AsyncScheduler};
//!
//! let scheduler = AsyncScheduler::manual();
//! let root = scheduler.schedule(|| Ok(5));
//! let next = root.then(|v| Ok(v + 1));
//! assert_eq!(next.wait()?, 6);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod outcome;
pub mod result;
pub mod scheduler;
pub mod task;

pub use error::{kinds, ErrorKind, ErrorValue, TaskResult};
pub use outcome::Outcome;
pub use result::AsyncResult;
pub use scheduler::{
    AsyncScheduler, Executor, ManualAsyncRunner, PoolConfig, SchedulerError, SchedulerStats,
    ThreadPoolScheduler,
};
pub use task::{AsyncTask, BodyKind, ChildRef, TaskId, TaskRef, TaskState, TaskValue};
