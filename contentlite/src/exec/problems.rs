// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Problems reported by the execution engine alongside results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a reported problem.
///
/// Errors fail the query; warnings ride along on otherwise usable results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem encountered while parsing, planning, or executing a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "warning: {}", self.message),
            Severity::Error => write!(f, "error: {}", self.message),
        }
    }
}

/// Ordered collection of problems attached to a set of engine results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Problems {
    problems: Vec<Problem>,
}

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error-severity problem
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.problems.push(Problem {
            severity: Severity::Error,
            message: message.into(),
        });
    }

    /// Record a warning-severity problem
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.problems.push(Problem {
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    /// Append every problem of another collection
    pub fn extend(&mut self, other: Problems) {
        self.problems.extend(other.problems);
    }

    pub fn has_errors(&self) -> bool {
        self.problems
            .iter()
            .any(|p| p.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.problems
            .iter()
            .any(|p| p.severity == Severity::Warning)
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    /// Only the error-severity problems
    pub fn errors(&self) -> impl Iterator<Item = &Problem> {
        self.problems
            .iter()
            .filter(|p| p.severity == Severity::Error)
    }

    /// Only the warning-severity problems
    pub fn warnings(&self) -> impl Iterator<Item = &Problem> {
        self.problems
            .iter()
            .filter(|p| p.severity == Severity::Warning)
    }
}

impl fmt::Display for Problems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            problem.fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_alone_are_not_errors() {
        let mut problems = Problems::new();
        problems.add_warning("column 'size' is never populated");
        assert!(!problems.has_errors());
        assert!(problems.has_warnings());
    }

    #[test]
    fn test_display_joins_messages() {
        let mut problems = Problems::new();
        problems.add_error("no value bound to variable '$colorVar'");
        problems.add_warning("something minor");
        assert_eq!(
            problems.to_string(),
            "error: no value bound to variable '$colorVar'; warning: something minor"
        );
    }
}
