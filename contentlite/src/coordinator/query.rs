// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Query - the client-facing coordinator for a single query.
//!
//! A `Query` owns the mutable session state of one client-issued query
//! (bound variable values, limit/offset, plan hints) and drives execution,
//! plan-only explain, and cross-thread cancellation against an external
//! [`QueryEngine`]. Mutators take `&mut self`; `execute`, `explain`, and
//! `cancel` take `&self` and are safe to call concurrently from multiple
//! threads sharing one query.

use crate::coordinator::error::QueryError;
use crate::coordinator::result::{QueryOutcome, QueryResult};
use crate::coordinator::slot::ExecutionSlot;
use crate::exec::engine::{ExecutionHandle, QueryEngine, RunOutcome};
use crate::exec::problems::Problems;
use crate::model::visit::{self, Visitor};
use crate::model::{is_subquery_variable_name, QueryCommand, Value};
use crate::plan::PlanHints;
use crate::session::QueryContext;
use log::{debug, trace};
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// The coordinator for one client-issued query
pub struct Query {
    context: Arc<dyn QueryContext>,
    engine: Arc<dyn QueryEngine>,
    statement: String,
    language: String,
    /// Path this query was loaded from, if it is a stored query
    stored_at_path: Option<String>,
    /// Current model root; replaced wholesale by the limit/offset mutators
    model: Arc<QueryCommand>,
    hints: PlanHints,
    variables: HashMap<String, Value>,
    /// Memoized set of variable names referenced by the model. A pure
    /// function of the immutable tree, so it needs no invalidation: the
    /// limit/offset mutators never touch variable references.
    variable_names: OnceCell<HashSet<String>>,
    executing: ExecutionSlot<dyn ExecutionHandle>,
}

impl Query {
    /// Create a query from its original statement, the language it was
    /// stated in, and the parsed model
    pub fn new(
        context: Arc<dyn QueryContext>,
        engine: Arc<dyn QueryEngine>,
        statement: impl Into<String>,
        language: impl Into<String>,
        model: Arc<QueryCommand>,
        hints: PlanHints,
    ) -> Self {
        Self {
            context,
            engine,
            statement: statement.into(),
            language: language.into(),
            stored_at_path: None,
            model,
            hints,
            variables: HashMap::new(),
            variable_names: OnceCell::new(),
            executing: ExecutionSlot::new(),
        }
    }

    /// Record the repository path this query was loaded from
    pub fn with_stored_at_path(mut self, path: impl Into<String>) -> Self {
        self.stored_at_path = Some(path.into());
        self
    }

    /// The original statement as supplied by the client
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// The language the statement is expressed in
    pub fn language(&self) -> &str {
        &self.language
    }

    /// The path this query was stored at, or `None` for ad-hoc queries
    pub fn stored_at_path(&self) -> Option<&str> {
        self.stored_at_path.as_deref()
    }

    /// The underlying immutable abstract query model
    pub fn abstract_query_model(&self) -> &Arc<QueryCommand> {
        &self.model
    }

    /// Readable rendering of the abstract query model
    pub fn abstract_query_model_representation(&self) -> String {
        self.model.to_string()
    }

    /// Read-only view of the plan hints
    pub fn hints(&self) -> &PlanHints {
        &self.hints
    }

    /// Control whether executions of this query include system content
    pub fn set_include_system_content(&mut self, include: bool) {
        self.hints.include_system_content = include;
    }

    /// Execute the query and block until it completes or is cancelled.
    ///
    /// Concurrent `execute` calls on one query coalesce onto a single
    /// physical execution: whichever handle occupies the execution slot
    /// first is the one every racing caller runs and waits on, and a
    /// racing caller's own freshly created handle is discarded unused.
    pub fn execute(&self) -> Result<QueryOutcome, QueryError> {
        self.context.check_valid()?;
        let start = Instant::now();

        // Create an execution for the current (model, hints, variables)
        // and install it in the slot, capturing any previous occupant.
        let new_execution =
            self.engine
                .create_execution(&self.model, self.hints.clone(), &self.variables)?;
        let execution = match self.executing.swap(Arc::clone(&new_execution)) {
            Some(in_flight) => {
                // Another thread is already executing this query; run its
                // handle and wait for the shared outcome.
                debug!("coalescing onto in-flight execution of: {}", self.statement);
                in_flight
            }
            None => new_execution,
        };

        let outcome = execution.run()?;

        // Clear the slot, but only if it still holds the handle this call
        // ran; a newer execution's registration must survive our cleanup.
        self.executing.compare_and_clear(&execution);

        let results = match outcome {
            RunOutcome::Cancelled => {
                debug!("execution cancelled: {}", self.statement);
                return Ok(QueryOutcome::Cancelled);
            }
            RunOutcome::Complete(results) => results,
        };
        check_for_problems(&results.problems)?;
        self.context
            .record_duration(start.elapsed(), &self.statement, &self.language);
        Ok(QueryOutcome::Results(QueryResult::new(
            &self.statement,
            results,
            self.hints.restartable,
            self.hints.rows_kept_in_memory,
        )))
    }

    /// Compute the query plan without producing rows.
    ///
    /// Runs on a private clone of the hints with the plan-only flag set, so
    /// the query's own hints are untouched. The execution is never
    /// registered in the execution slot and therefore cannot be reached by
    /// [`cancel`](Self::cancel). Explain results are not restartable and
    /// buffer no rows.
    pub fn explain(&self) -> Result<QueryOutcome, QueryError> {
        self.context.check_valid()?;

        let mut hints = self.hints.clone();
        hints.plan_only = true;
        let execution = self
            .engine
            .create_execution(&self.model, hints, &self.variables)?;

        let results = match execution.run()? {
            RunOutcome::Cancelled => return Ok(QueryOutcome::Cancelled),
            RunOutcome::Complete(results) => results,
        };
        check_for_problems(&results.problems)?;
        Ok(QueryOutcome::Results(QueryResult::new(
            &self.statement,
            results,
            false,
            0,
        )))
    }

    /// Cancel the currently executing operation, if there is one.
    ///
    /// Returns the engine's cancellation outcome, or `false` when nothing
    /// is in flight. Only the handle occupying the slot at the moment of
    /// the read is affected; an execution registered immediately after is
    /// left alone.
    pub fn cancel(&self) -> bool {
        match self.executing.peek() {
            Some(executing) => {
                trace!("cancelling in-flight execution of: {}", self.statement);
                let cancelled = executing.cancel();
                // Remove the reference only if it is still the one we read.
                self.executing.compare_and_clear(&executing);
                cancelled
            }
            None => false,
        }
    }

    /// Bind a value to a variable referenced by the query.
    ///
    /// The name must be either a variable discovered in the model or follow
    /// the reserved subquery naming convention; the null value is rejected
    /// as absent. On failure the bound-variable map is left unchanged.
    pub fn bind(&mut self, name: &str, value: Value) -> Result<(), QueryError> {
        if name.is_empty() {
            return Err(QueryError::InvalidArgument(
                "bind variable name may not be empty".to_string(),
            ));
        }
        if value.is_null() {
            return Err(QueryError::InvalidArgument(format!(
                "value bound to '${}' may not be null",
                name
            )));
        }
        if !self.variable_names().contains(name) && !is_subquery_variable_name(name) {
            return Err(QueryError::InvalidArgument(format!(
                "no variable named '${}' in query: {}",
                name, self.statement
            )));
        }
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// The names of every bind variable referenced by the model, as a
    /// fresh, independent copy
    pub fn bind_variable_names(&self) -> HashSet<String> {
        self.variable_names().clone()
    }

    /// Limit the number of result rows.
    ///
    /// Values above the 32-bit range clamp to `i32::MAX`; negative values
    /// pass through for the engine to judge. Setting the current value
    /// again leaves the model root untouched.
    pub fn set_limit(&mut self, limit: i64) {
        self.model = QueryCommand::with_row_limit(&self.model, saturate_to_i32(limit));
    }

    /// Skip the given number of result rows; same value handling as
    /// [`set_limit`](Self::set_limit)
    pub fn set_offset(&mut self, offset: i64) {
        self.model = QueryCommand::with_offset(&self.model, saturate_to_i32(offset));
    }

    fn variable_names(&self) -> &HashSet<String> {
        // Pure function of the immutable model, so racing recomputation
        // would be harmless; the cell computes it once and publishes it.
        self.variable_names.get_or_init(|| {
            let mut collector = BindVariableCollector::default();
            visit::walk(&self.model, &mut collector);
            collector.names
        })
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}\nAQM -> {}",
            self.language, self.statement, self.model
        )
    }
}

/// Collects every distinct bind-variable reference in a model
#[derive(Default)]
struct BindVariableCollector {
    names: HashSet<String>,
}

impl Visitor for BindVariableCollector {
    fn visit_bind_variable(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }
}

/// Convert error-severity problems into a failure; warnings ride along
fn check_for_problems(problems: &Problems) -> Result<(), QueryError> {
    if problems.has_errors() {
        return Err(QueryError::Problems(problems.clone()));
    }
    Ok(())
}

fn saturate_to_i32(n: i64) -> i32 {
    n.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
