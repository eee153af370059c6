// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Atomically-updated single-reference cell for the in-flight execution.
//!
//! The slot holds at most one execution handle per query and supports the
//! three operations the execute/cancel protocol needs: unconditional swap,
//! non-destructive read, and compare-and-clear against an exact previously
//! observed occupant. The internal mutex is held only for the pointer
//! operation itself, never across engine work, so the slot behaves as an
//! atomic reference cell, not as a lock around the protocol.

use parking_lot::Mutex;
use std::ptr;
use std::sync::Arc;

/// Single-reference cell tracking the currently executing handle
pub struct ExecutionSlot<H: ?Sized> {
    cell: Mutex<Option<Arc<H>>>,
}

impl<H: ?Sized> ExecutionSlot<H> {
    pub fn new() -> Self {
        Self {
            cell: Mutex::new(None),
        }
    }

    /// Install a handle and return whatever occupied the slot before
    pub fn swap(&self, handle: Arc<H>) -> Option<Arc<H>> {
        self.cell.lock().replace(handle)
    }

    /// Read the current occupant without removing it
    pub fn peek(&self) -> Option<Arc<H>> {
        self.cell.lock().clone()
    }

    /// Clear the slot only if it still holds exactly `expected`.
    ///
    /// Identity is reference identity, so a handle registered by a newer,
    /// unrelated execution is never erased by a stale cleanup. Returns
    /// whether the slot was cleared.
    pub fn compare_and_clear(&self, expected: &Arc<H>) -> bool {
        let mut cell = self.cell.lock();
        match cell.as_ref() {
            Some(current) if ptr::addr_eq(Arc::as_ptr(current), Arc::as_ptr(expected)) => {
                *cell = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cell.lock().is_none()
    }
}

impl<H: ?Sized> Default for ExecutionSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_returns_previous_occupant() {
        let slot: ExecutionSlot<i32> = ExecutionSlot::new();
        let first = Arc::new(1);
        let second = Arc::new(2);

        assert!(slot.swap(Arc::clone(&first)).is_none());
        let previous = slot.swap(Arc::clone(&second));
        assert!(previous.is_some_and(|p| Arc::ptr_eq(&p, &first)));
    }

    #[test]
    fn test_peek_is_non_destructive() {
        let slot: ExecutionSlot<i32> = ExecutionSlot::new();
        assert!(slot.peek().is_none());

        let handle = Arc::new(7);
        slot.swap(Arc::clone(&handle));
        assert!(slot.peek().is_some_and(|p| Arc::ptr_eq(&p, &handle)));
        assert!(!slot.is_empty());
    }

    #[test]
    fn test_compare_and_clear_requires_identity_not_equality() {
        let slot: ExecutionSlot<i32> = ExecutionSlot::new();
        let occupant = Arc::new(42);
        let equal_but_distinct = Arc::new(42);

        slot.swap(Arc::clone(&occupant));
        assert!(!slot.compare_and_clear(&equal_but_distinct));
        assert!(!slot.is_empty());
        assert!(slot.compare_and_clear(&occupant));
        assert!(slot.is_empty());
    }

    #[test]
    fn test_stale_clear_never_erases_newer_occupant() {
        let slot: ExecutionSlot<i32> = ExecutionSlot::new();
        let older = Arc::new(1);
        let newer = Arc::new(2);

        slot.swap(Arc::clone(&older));
        slot.swap(Arc::clone(&newer));
        assert!(!slot.compare_and_clear(&older));
        assert!(slot.peek().is_some_and(|p| Arc::ptr_eq(&p, &newer)));
    }

    #[test]
    fn test_clear_on_empty_slot_is_a_noop() {
        let slot: ExecutionSlot<i32> = ExecutionSlot::new();
        let handle = Arc::new(1);
        assert!(!slot.compare_and_clear(&handle));
    }
}
