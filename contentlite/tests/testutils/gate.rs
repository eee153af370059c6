//! Engine whose executions block on a shared gate.
//!
//! Executions wait until the gate opens or they are cancelled, and the
//! engine counts handle creations, `run` entries, and physical
//! computations. This makes the coordinator's coalescing and cancellation
//! protocol observable without sleeping on timing.

use contentlite::{
    EngineResults, ExecutionHandle, PlanHints, QueryCommand, QueryEngine, QueryError, RunOutcome,
    Value,
};
use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct GateShared {
    created: AtomicUsize,
    runs_started: AtomicUsize,
    computations: AtomicUsize,
    opened: Mutex<bool>,
    cvar: Condvar,
}

impl GateShared {
    /// Block until the gate opens or the handle is cancelled; returns
    /// whether cancellation won
    fn wait_cancelled(&self, cancelled: &AtomicBool) -> bool {
        let mut opened = self.opened.lock();
        loop {
            if cancelled.load(Ordering::SeqCst) {
                return true;
            }
            if *opened {
                return false;
            }
            let _ = self
                .cvar
                .wait_for(&mut opened, Duration::from_millis(10));
        }
    }
}

/// Engine producing gate-blocked executions
pub struct GateEngine {
    shared: Arc<GateShared>,
}

impl GateEngine {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(GateShared {
                created: AtomicUsize::new(0),
                runs_started: AtomicUsize::new(0),
                computations: AtomicUsize::new(0),
                opened: Mutex::new(false),
                cvar: Condvar::new(),
            }),
        }
    }

    /// Release every blocked execution
    pub fn open_gate(&self) {
        *self.shared.opened.lock() = true;
        self.shared.cvar.notify_all();
    }

    /// Number of handles created so far
    pub fn created(&self) -> usize {
        self.shared.created.load(Ordering::SeqCst)
    }

    /// Number of `run` calls entered so far
    pub fn runs_started(&self) -> usize {
        self.shared.runs_started.load(Ordering::SeqCst)
    }

    /// Number of physical executions actually computed
    pub fn computations(&self) -> usize {
        self.shared.computations.load(Ordering::SeqCst)
    }
}

impl QueryEngine for GateEngine {
    fn create_execution(
        &self,
        _model: &Arc<QueryCommand>,
        hints: PlanHints,
        _variables: &HashMap<String, Value>,
    ) -> Result<Arc<dyn ExecutionHandle>, QueryError> {
        self.shared.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(GateHandle {
            shared: Arc::clone(&self.shared),
            plan_only: hints.plan_only,
            cancelled: AtomicBool::new(false),
            outcome: OnceCell::new(),
        }))
    }
}

struct GateHandle {
    shared: Arc<GateShared>,
    plan_only: bool,
    cancelled: AtomicBool,
    outcome: OnceCell<Result<RunOutcome, QueryError>>,
}

impl ExecutionHandle for GateHandle {
    fn run(&self) -> Result<RunOutcome, QueryError> {
        self.shared.runs_started.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .get_or_init(|| {
                if self.plan_only {
                    // Plan-only executions complete immediately.
                    return Ok(RunOutcome::Complete(
                        EngineResults::new(vec!["value".to_string()])
                            .with_plan("Gate".to_string()),
                    ));
                }
                self.shared.computations.fetch_add(1, Ordering::SeqCst);
                if self.shared.wait_cancelled(&self.cancelled) {
                    return Ok(RunOutcome::Cancelled);
                }
                Ok(RunOutcome::Complete(EngineResults::new(vec![
                    "value".to_string()
                ])))
            })
            .clone()
    }

    fn cancel(&self) -> bool {
        if self.outcome.get().is_some() {
            return false;
        }
        self.cancelled.store(true, Ordering::SeqCst);
        self.shared.cvar.notify_all();
        true
    }
}
