// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Generic traversal over the abstract query model.
//!
//! [`walk`] performs a full recursive walk of a command tree (constraint
//! trees, operands, orderings, columns, nested subqueries, and both branches
//! of set queries) and invokes the matching [`Visitor`] hook for each node
//! kind it passes. Hooks default to no-ops, so a visitor implements only the
//! node kinds it cares about.

use super::{
    Column, Comparison, Constraint, DynamicOperand, Limit, Ordering, PropertyExistence,
    QueryCommand, Selector, SetCriteria, StaticOperand, Value,
};

/// Callbacks for the node kinds encountered during a model walk
#[allow(unused_variables)]
pub trait Visitor {
    fn visit_selector(&mut self, selector: &Selector) {}
    fn visit_column(&mut self, column: &Column) {}
    fn visit_ordering(&mut self, ordering: &Ordering) {}
    fn visit_limit(&mut self, limit: &Limit) {}
    fn visit_comparison(&mut self, comparison: &Comparison) {}
    fn visit_property_existence(&mut self, existence: &PropertyExistence) {}
    fn visit_set_criteria(&mut self, criteria: &SetCriteria) {}
    fn visit_property_value(&mut self, selector: Option<&str>, property: &str) {}
    fn visit_bind_variable(&mut self, name: &str) {}
    fn visit_literal(&mut self, value: &Value) {}
    fn visit_subquery(&mut self, subquery: &QueryCommand) {}
}

/// Walk an entire command tree, nested subqueries included
pub fn walk<V: Visitor + ?Sized>(command: &QueryCommand, visitor: &mut V) {
    match command {
        QueryCommand::Select(query) => {
            visitor.visit_selector(&query.source);
            if let Some(constraint) = &query.constraint {
                walk_constraint(constraint, visitor);
            }
            for ordering in &query.orderings {
                visitor.visit_ordering(ordering);
                walk_dynamic(&ordering.operand, visitor);
            }
            for column in &query.columns {
                visitor.visit_column(column);
            }
            visitor.visit_limit(&query.limits);
        }
        QueryCommand::SetQuery(query) => {
            walk(&query.left, visitor);
            walk(&query.right, visitor);
            visitor.visit_limit(&query.limits);
        }
    }
}

fn walk_constraint<V: Visitor + ?Sized>(constraint: &Constraint, visitor: &mut V) {
    match constraint {
        Constraint::And(left, right) | Constraint::Or(left, right) => {
            walk_constraint(left, visitor);
            walk_constraint(right, visitor);
        }
        Constraint::Not(inner) => walk_constraint(inner, visitor),
        Constraint::Comparison(comparison) => {
            visitor.visit_comparison(comparison);
            walk_dynamic(&comparison.operand1, visitor);
            walk_static(&comparison.operand2, visitor);
        }
        Constraint::PropertyExistence(existence) => visitor.visit_property_existence(existence),
        Constraint::SetCriteria(criteria) => {
            visitor.visit_set_criteria(criteria);
            walk_dynamic(&criteria.operand, visitor);
            for value in &criteria.values {
                walk_static(value, visitor);
            }
        }
    }
}

fn walk_dynamic<V: Visitor + ?Sized>(operand: &DynamicOperand, visitor: &mut V) {
    match operand {
        DynamicOperand::PropertyValue { selector, property } => {
            visitor.visit_property_value(selector.as_deref(), property);
        }
        DynamicOperand::NodeName { .. } => {}
        DynamicOperand::LowerCase(inner) | DynamicOperand::UpperCase(inner) => {
            walk_dynamic(inner, visitor);
        }
    }
}

fn walk_static<V: Visitor + ?Sized>(operand: &StaticOperand, visitor: &mut V) {
    match operand {
        StaticOperand::Literal(value) => visitor.visit_literal(value),
        StaticOperand::BindVariable(name) => visitor.visit_bind_variable(name),
        StaticOperand::Subquery(subquery) => {
            visitor.visit_subquery(subquery);
            walk(subquery, visitor);
        }
    }
}
