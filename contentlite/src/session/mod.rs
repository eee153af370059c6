// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Session context consumed by the query coordinator.
//!
//! The coordinator only needs two things from its owning session: a
//! validity check before any engine call, and a sink for execution
//! durations. [`Session`] is the in-process implementation; server
//! embeddings can provide their own [`QueryContext`].

use crate::coordinator::error::QueryError;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

/// The owning context a query validates against and reports to
pub trait QueryContext: Send + Sync {
    /// Fail fast if the owning session/repository is no longer usable
    fn check_valid(&self) -> Result<(), QueryError>;

    /// Record how long a query took to execute. Side-effect only; never
    /// fails the call.
    fn record_duration(&self, elapsed: Duration, statement: &str, language: &str);
}

/// Cumulative query statistics for one session
#[derive(Debug, Default)]
pub struct QueryMetrics {
    queries: AtomicU64,
    total_nanos: AtomicU64,
}

impl QueryMetrics {
    pub fn record(&self, elapsed: Duration) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.total_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn query_count(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }
}

/// An in-process session: valid until closed, with per-session metrics
pub struct Session {
    id: Uuid,
    active: AtomicBool,
    metrics: QueryMetrics,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            active: AtomicBool::new(true),
            metrics: QueryMetrics::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Close the session; queries created against it fail from now on
    pub fn close(&self) {
        self.active.store(false, Ordering::Release);
        debug!("session {} closed", self.id);
    }

    pub fn metrics(&self) -> &QueryMetrics {
        &self.metrics
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryContext for Session {
    fn check_valid(&self) -> Result<(), QueryError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(QueryError::InvalidState(format!(
                "session {} is closed",
                self.id
            )))
        }
    }

    fn record_duration(&self, elapsed: Duration, statement: &str, language: &str) {
        self.metrics.record(elapsed);
        debug!("{} query completed in {:?}: {}", language, elapsed, statement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_session_fails_validity_check() {
        let session = Session::new();
        assert!(session.check_valid().is_ok());
        session.close();
        assert!(matches!(
            session.check_valid(),
            Err(QueryError::InvalidState(_))
        ));
    }

    #[test]
    fn test_metrics_accumulate() {
        let session = Session::new();
        session.record_duration(Duration::from_millis(3), "q1", "sql");
        session.record_duration(Duration::from_millis(4), "q2", "sql");
        assert_eq!(session.metrics().query_count(), 2);
        assert!(session.metrics().total_duration() >= Duration::from_millis(7));
    }
}
