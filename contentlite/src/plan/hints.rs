// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Hints that steer how a query is planned and executed

use serde::{Deserialize, Serialize};

/// A small bag of flags passed to the execution engine alongside the model.
///
/// Each query owns one instance. Plan-only execution (`explain`) operates on
/// a private clone so the query's own hints are never perturbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanHints {
    /// Compute and return the query plan without producing any rows
    pub plan_only: bool,
    /// Include system content in the results
    pub include_system_content: bool,
    /// Whether results must support being restarted from the beginning
    pub restartable: bool,
    /// Number of result rows buffered in memory for restartable results
    pub rows_kept_in_memory: usize,
}

impl PlanHints {
    pub fn new() -> Self {
        Self {
            plan_only: false,
            include_system_content: false,
            restartable: false,
            rows_kept_in_memory: 0,
        }
    }
}

impl Default for PlanHints {
    fn default() -> Self {
        Self::new()
    }
}
