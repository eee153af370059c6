// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Query planning surface exposed to the coordinator

pub mod hints;

pub use hints::PlanHints;
