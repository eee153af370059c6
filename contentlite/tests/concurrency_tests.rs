//! Concurrency protocol tests: single-flight coalescing, cross-thread
//! cancellation, and explain's isolation from the execution slot.
//!
//! These use the gate engine so every interleaving is reached by waiting
//! on observable counters instead of timing.

#[path = "testutils/mod.rs"]
mod testutils;

use contentlite::{
    PlanHints, Query, QueryContext, QueryEngine, SelectQuery, Selector, Session,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use testutils::gate::GateEngine;

fn gated_query(engine: &Arc<GateEngine>) -> Query {
    let context: Arc<dyn QueryContext> = Arc::new(Session::new());
    let engine: Arc<dyn QueryEngine> = engine.clone();
    let model = SelectQuery::new(Selector::new("widget")).into_command();
    Query::new(
        context,
        engine,
        "find all widgets",
        "sql",
        model,
        PlanHints::new(),
    )
}

/// Spin until a counter-backed condition holds; panics after five seconds
fn wait_until(description: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            Instant::now() < deadline,
            "timed out waiting for {}",
            description
        );
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_concurrent_executes_coalesce_onto_one_physical_execution() {
    let engine = Arc::new(GateEngine::new());
    let query = gated_query(&engine);

    thread::scope(|scope| {
        let first = scope.spawn(|| query.execute());
        wait_until("the first execution to start running", || {
            engine.runs_started() == 1
        });

        let second = scope.spawn(|| query.execute());
        wait_until("the second caller to join the in-flight run", || {
            engine.runs_started() == 2
        });
        // Both callers created a handle, but they converged on one run.
        assert_eq!(engine.created(), 2);

        engine.open_gate();
        let first = first.join().expect("no panic").expect("no error");
        let second = second.join().expect("no panic").expect("no error");
        assert!(first.results().is_some());
        assert!(second.results().is_some());
    });

    // Exactly one physical execution served both callers.
    assert_eq!(engine.computations(), 1);

    // The losing caller's own handle was registered and discarded unused;
    // it still occupies the slot until cancelled or replaced.
    assert!(query.cancel());
    assert!(!query.cancel());
}

#[test]
fn test_cancel_reaches_the_in_flight_execution_and_empties_the_slot() {
    let engine = Arc::new(GateEngine::new());
    let query = gated_query(&engine);

    thread::scope(|scope| {
        let executing = scope.spawn(|| query.execute());
        wait_until("the execution to start running", || {
            engine.runs_started() == 1
        });

        assert!(query.cancel());

        let outcome = executing.join().expect("no panic").expect("no error");
        assert!(outcome.is_cancelled());
    });

    // The slot is empty afterwards: nothing left to cancel.
    assert!(!query.cancel());
    assert_eq!(engine.computations(), 1);
}

#[test]
fn test_explain_is_never_registered_in_the_slot() {
    let engine = Arc::new(GateEngine::new());
    let query = gated_query(&engine);

    thread::scope(|scope| {
        let executing = scope.spawn(|| query.execute());
        wait_until("the execution to start running", || {
            engine.runs_started() == 1
        });

        // Explain completes while the execution is still blocked, and a
        // concurrent cancel never reaches it.
        let explained = query
            .explain()
            .expect("explain succeeds")
            .into_results()
            .expect("explain was not cancelled");
        assert_eq!(explained.plan(), Some("Gate"));
        assert!(!explained.is_restartable());
        assert_eq!(explained.rows_kept_in_memory(), 0);
        assert_eq!(engine.created(), 2);

        // The slot still holds the execute handle, not the explain one.
        assert!(query.cancel());
        let outcome = executing.join().expect("no panic").expect("no error");
        assert!(outcome.is_cancelled());
    });

    assert!(!query.cancel());
}
