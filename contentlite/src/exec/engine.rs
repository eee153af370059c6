// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Execution engine interface consumed by the query coordinator.
//!
//! The coordinator never parses, plans, or produces rows itself; it hands
//! the `(model, hints, variables)` triple to a [`QueryEngine`] and drives
//! the returned [`ExecutionHandle`] through its lifecycle:
//! created -> running -> completed or cancelled. Handles are never reused
//! after reaching a terminal state.

use crate::coordinator::error::QueryError;
use crate::exec::results::EngineResults;
use crate::model::{QueryCommand, Value};
use crate::plan::PlanHints;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of running an execution handle to the end
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The execution ran to completion
    Complete(EngineResults),
    /// The execution was cancelled before it finished
    Cancelled,
}

/// One in-progress or finished execution of a query.
///
/// `run` blocks the calling thread for the whole execution and is
/// internally single-flight: concurrent `run` calls on the same handle
/// converge on one physical execution and all observe its outcome.
pub trait ExecutionHandle: Send + Sync {
    /// Run to completion or cancellation and return the outcome
    fn run(&self) -> Result<RunOutcome, QueryError>;

    /// Request cancellation.
    ///
    /// Best-effort and idempotent; cancellation is cooperative, so the
    /// running execution decides how promptly it takes effect. Returns
    /// `false` once the handle has already reached a terminal state.
    fn cancel(&self) -> bool;
}

/// Factory for execution handles, implemented by the external engine.
pub trait QueryEngine: Send + Sync {
    /// Create a new execution bound to the given model, hints, and bound
    /// variable values.
    ///
    /// Must be synchronous (no work beyond validation) and side-effect
    /// free: the coordinator's coalescing protocol may discard a freshly
    /// created handle without ever running it.
    fn create_execution(
        &self,
        model: &Arc<QueryCommand>,
        hints: PlanHints,
        variables: &HashMap<String, Value>,
    ) -> Result<Arc<dyn ExecutionHandle>, QueryError>;
}
