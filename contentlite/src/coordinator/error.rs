// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Query error types

use crate::exec::problems::Problems;
use thiserror::Error;

/// Failures surfaced by the query coordinator.
///
/// Cancellation is deliberately not represented here: a cancelled execution
/// is an outcome, reported as
/// [`QueryOutcome::Cancelled`](crate::coordinator::QueryOutcome::Cancelled).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The owning session or repository is no longer usable
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A required argument was missing or not acceptable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine reported error-severity problems with the query
    #[error("Query cannot be executed with errors: {0}")]
    Problems(Problems),

    /// The engine failed outright
    #[error("Engine error: {0}")]
    Engine(String),
}
