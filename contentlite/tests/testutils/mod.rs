//! Test utilities for ContentLite integration tests
//!
//! Two helpers are available:
//! - `fixture::TestFixture`: an in-memory repository with sample content
//!   items, backed by the reference engine
//! - `gate::GateEngine`: an engine whose executions block on a gate until
//!   released or cancelled, for deterministic concurrency tests

pub mod fixture;
pub mod gate;
