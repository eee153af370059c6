// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! ContentLite - A lightweight content repository query layer
//!
//! ContentLite coordinates the lifecycle of content-repository queries: it
//! owns each query's session state (bound variables, limit/offset, plan
//! hints) and drives execution, plan-only explain, and cross-thread
//! cancellation against a pluggable execution engine.
//!
//! # Features
//!
//! - **Immutable query model**: queries are trees that are never edited in
//!   place; limit/offset changes produce a new root sharing unaffected
//!   substructure
//! - **Single-flight execution**: concurrent `execute()` calls on one query
//!   coalesce onto a single physical execution
//! - **Cross-thread cancellation**: `cancel()` reaches the in-flight
//!   execution through an atomically-updated slot, without locks around
//!   the protocol
//! - **Pluggable engines**: parsing, planning, and row production live
//!   behind the [`QueryEngine`] trait; an in-memory reference engine ships
//!   with the crate
//!
//! # Usage
//!
//! ```no_run
//! use contentlite::{
//!     Comparison, Constraint, DynamicOperand, MemoryEngine, MemoryRepository, Operator,
//!     PlanHints, Query, SelectQuery, Selector, Session, StaticOperand, Value,
//! };
//! use std::sync::Arc;
//!
//! let mut repository = MemoryRepository::new();
//! // ... add content items ...
//! let engine = Arc::new(MemoryEngine::new(repository));
//! let session = Arc::new(Session::new());
//!
//! let model = SelectQuery::new(Selector::new("widget"))
//!     .with_constraint(Constraint::Comparison(Comparison::new(
//!         DynamicOperand::property("color"),
//!         Operator::EqualTo,
//!         StaticOperand::bind_variable("colorVar"),
//!     )))
//!     .into_command();
//!
//! let mut query = Query::new(
//!     session,
//!     engine,
//!     "find items where color = $colorVar",
//!     "sql",
//!     model,
//!     PlanHints::new(),
//! );
//! query.bind("colorVar", Value::from("red")).unwrap();
//! let outcome = query.execute().unwrap();
//! ```

pub mod coordinator;
pub mod exec;
pub mod model;
pub mod plan;
pub mod session;

// Re-export the client-facing API
pub use coordinator::{ExecutionSlot, Query, QueryError, QueryOutcome, QueryResult};
pub use exec::{
    ContentItem, EngineResults, ExecutionHandle, MemoryEngine, MemoryRepository, Problem,
    Problems, QueryEngine, ResultRow, RunOutcome, Severity,
};
pub use model::{
    is_subquery_variable_name, Column, Comparison, Constraint, DynamicOperand, Limit, Operator,
    Order, Ordering, PropertyExistence, QueryCommand, SelectQuery, Selector, SetCriteria,
    SetOperator, SetQuery, StaticOperand, Value, SUBQUERY_VARIABLE_PREFIX,
};
pub use plan::PlanHints;
pub use session::{QueryContext, QueryMetrics, Session};

/// ContentLite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ContentLite crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
