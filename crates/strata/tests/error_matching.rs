//! Integration tests for hierarchy-aware error handlers and wait-boundary wrapping

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use strata::{kinds, AsyncResult, AsyncScheduler, ErrorKind, ErrorValue, TaskResult};

static IO: ErrorKind = ErrorKind::extends("IoFailure", &kinds::RUNTIME);
static FILE_NOT_FOUND: ErrorKind = ErrorKind::extends("FileNotFound", &IO);
static TIMEOUT: ErrorKind = ErrorKind::extends("Timeout", &IO);
static PARSE: ErrorKind = ErrorKind::extends("ParseFailure", &kinds::RUNTIME);

/// Every kind paired with whether a `catch_error(handler)` on it recovers a
/// `FileNotFound` failure
static FILE_NOT_FOUND_HANDLERS: &[(&ErrorKind, bool)] = &[
    (&FILE_NOT_FOUND, true),
    (&IO, true),
    (&kinds::RUNTIME, true),
    (&kinds::ERROR, true),
    (&TIMEOUT, false),
    (&PARSE, false),
    (&kinds::AWAIT, false),
    (&kinds::ILLEGAL_STATE, false),
];

fn failing(scheduler: &AsyncScheduler, kind: &'static ErrorKind) -> strata::AsyncTask<i32> {
    scheduler.schedule(move || Err(ErrorValue::new(kind, "failed")))
}

#[test]
fn test_catch_matches_exactly_the_ancestor_chain() {
    let scheduler = AsyncScheduler::manual();

    for &(handler_kind, recovers) in FILE_NOT_FOUND_HANDLERS {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let task = failing(&scheduler, &FILE_NOT_FOUND).catch_error(handler_kind, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(1)
        });

        let result = task.wait();
        assert_eq!(result.is_ok(), recovers, "handler kind {}", handler_kind);
        assert_eq!(calls.load(Ordering::SeqCst), recovers as usize, "handler kind {}", handler_kind);
    }
}

#[test]
fn test_handler_receives_original_error() {
    let scheduler = AsyncScheduler::manual();
    let root = failing(&scheduler, &TIMEOUT);
    let task = root.catch_error(&IO, |error| {
        assert_eq!(error.kind(), &TIMEOUT);
        assert_eq!(error.message(), "failed");
        Ok(0)
    });
    assert_eq!(task.wait().unwrap(), 0);
}

#[test]
fn test_handler_error_replaces_failure() {
    let scheduler = AsyncScheduler::manual();
    let task = failing(&scheduler, &FILE_NOT_FOUND)
        .catch_error(&IO, |error| Err(ErrorValue::with_cause(&PARSE, "rethrown", error)));

    let err = task.wait_expecting(&PARSE).unwrap_err();
    assert_eq!(err.message(), "rethrown");
    assert_eq!(err.cause().unwrap().kind(), &FILE_NOT_FOUND);
}

#[test]
fn test_catch_error_result_waits_on_handler_task() {
    let scheduler = AsyncScheduler::manual();
    let recovery = scheduler.clone();
    let task = failing(&scheduler, &TIMEOUT)
        .catch_error_result(&IO, move |_| recovery.schedule(|| Ok(99)).into());
    assert_eq!(task.wait().unwrap(), 99);
}

#[test]
fn test_catch_error_result_propagates_unmatched() {
    let scheduler = AsyncScheduler::manual();
    let task = failing(&scheduler, &PARSE)
        .catch_error_result(&IO, |_| AsyncResult::success(1));
    let err = task.wait_expecting(&PARSE).unwrap_err();
    assert_eq!(err.kind(), &PARSE);
}

#[test]
fn test_catch_error_silently() {
    let scheduler = AsyncScheduler::manual();

    let swallowed = failing(&scheduler, &FILE_NOT_FOUND).catch_error_silently(&IO);
    assert_eq!(swallowed.wait().unwrap(), None);

    let passed = scheduler.schedule(|| Ok(5)).catch_error_silently(&IO);
    assert_eq!(passed.wait().unwrap(), Some(5));

    let unmatched = failing(&scheduler, &PARSE).catch_error_silently(&IO);
    assert!(unmatched.wait().is_err());
}

#[test]
fn test_on_error_observes_then_handles() {
    let scheduler = AsyncScheduler::manual();
    let observed = Arc::new(AtomicUsize::new(0));
    let seen = observed.clone();

    let task = failing(&scheduler, &TIMEOUT).on_error(&IO, move |error| {
        assert!(error.is(&TIMEOUT));
        seen.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    assert_eq!(task.wait().unwrap(), None);
    assert_eq!(task.wait().unwrap(), None);
    assert_eq!(observed.load(Ordering::SeqCst), 1);
}

#[test]
fn test_on_error_skipped_on_success() {
    let scheduler = AsyncScheduler::manual();
    let task = scheduler
        .schedule(|| Ok("fine"))
        .on_error(&kinds::ERROR, |_| panic!("handler must not run"));
    assert_eq!(task.wait().unwrap(), Some("fine"));
}

#[test]
fn test_on_error_result_handler_failure() {
    let scheduler = AsyncScheduler::manual();
    let task = failing(&scheduler, &TIMEOUT).on_error_result(&IO, |_| {
        AsyncResult::error(ErrorValue::new(&PARSE, "cleanup failed"))
    });
    let err = task.wait_expecting(&PARSE).unwrap_err();
    assert_eq!(err.message(), "cleanup failed");
}

#[test]
fn test_on_error_result_handled_yields_none() {
    let scheduler = AsyncScheduler::manual();
    let reports = Arc::new(AtomicUsize::new(0));
    let seen = reports.clone();
    let reporter = scheduler.clone();

    let task = failing(&scheduler, &FILE_NOT_FOUND).on_error_result(&IO, move |error| {
        assert!(error.is(&FILE_NOT_FOUND));
        reporter
            .schedule(move || {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .into()
    });

    assert_eq!(task.wait().unwrap(), None);
    assert_eq!(task.wait().unwrap(), None);
    assert_eq!(reports.load(Ordering::SeqCst), 1);
}

#[test]
fn test_observers_pass_unmatched_failure_through() {
    let scheduler = AsyncScheduler::manual();
    let root = failing(&scheduler, &PARSE);
    let original = root.outcome().error().cloned().unwrap();

    let observed = root.on_error(&IO, |_| panic!("handler must not run"));
    let reported = root.on_error_result(&TIMEOUT, |_| panic!("handler must not run"));

    assert!(observed.wait_expecting(&PARSE).unwrap_err().same_instance(&original));
    assert!(reported.wait_expecting(&PARSE).unwrap_err().same_instance(&original));

    let wrapped = observed.wait().unwrap_err();
    assert!(wrapped.cause().unwrap().same_instance(&original));
}

#[test]
fn test_wait_wraps_non_matching_failure() {
    let scheduler = AsyncScheduler::manual();
    let task = failing(&scheduler, &FILE_NOT_FOUND);
    let original = task.outcome().error().cloned().unwrap();

    let wrapped = task.wait().unwrap_err();
    assert_eq!(wrapped.kind(), &kinds::AWAIT);
    assert!(wrapped.cause().unwrap().same_instance(&original));
    assert!(wrapped.root_cause().same_instance(&original));
    assert!(wrapped.to_string().contains("FileNotFound"));

    let direct = task.wait_expecting(&IO).unwrap_err();
    assert!(direct.same_instance(&original));

    let unrelated = task.wait_expecting(&PARSE).unwrap_err();
    assert_eq!(unrelated.kind(), &kinds::AWAIT);
}

#[test]
fn test_nested_await_failure_is_not_rewrapped() {
    let scheduler = AsyncScheduler::manual();
    let inner = failing(&scheduler, &TIMEOUT);
    let outer_inner = inner.clone();
    let outer = scheduler.schedule(move || -> TaskResult<i32> { outer_inner.wait() });

    let err = outer.wait().unwrap_err();
    assert_eq!(err.kind(), &kinds::AWAIT);
    assert_eq!(err.cause().unwrap().kind(), &TIMEOUT);
}

#[test]
fn test_panicking_body_fails_with_panic_kind() {
    let scheduler = AsyncScheduler::manual();
    let task = scheduler.schedule(|| -> TaskResult<i32> { panic!("body exploded") });

    let err = task.wait_expecting(&kinds::PANIC).unwrap_err();
    assert_eq!(err.message(), "body exploded");

    let recovered = task.catch_error(&kinds::PANIC, |_| Ok(1));
    assert_eq!(recovered.wait().unwrap(), 1);
}

#[test]
fn test_ready_result_wait_follows_same_rules() {
    let failed: AsyncResult<i32> = AsyncResult::error(ErrorValue::new(&TIMEOUT, "late"));
    assert_eq!(failed.wait().unwrap_err().kind(), &kinds::AWAIT);
    assert_eq!(failed.wait_expecting(&IO).unwrap_err().kind(), &TIMEOUT);
    assert_eq!(AsyncResult::success(3).wait().unwrap(), 3);
}
