// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Query coordination: the client-facing query object, its execution slot,
//! and the outcome types it produces

pub mod error;
pub mod query;
pub mod result;
pub mod slot;

pub use error::QueryError;
pub use query::Query;
pub use result::{QueryOutcome, QueryResult};
pub use slot::ExecutionSlot;
