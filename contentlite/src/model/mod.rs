// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Abstract query model (AQM): the immutable tree representation of a
//! parsed query.
//!
//! A model is never mutated in place. Structural changes go through the
//! functional `with_*` updates on [`QueryCommand`], which return a new root
//! sharing all unaffected substructure (or the same root when nothing
//! changes). Anyone still holding an older root, such as an execution that
//! started before a limit change, keeps a fully valid tree.

mod display;
pub mod value;
pub mod visit;

pub use value::Value;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name prefix reserved for variables that carry subquery results.
pub const SUBQUERY_VARIABLE_PREFIX: &str = "__subquery";

static SUBQUERY_VARIABLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^__subquery\d*$").expect("valid subquery variable pattern"));

/// Check whether a variable name follows the reserved subquery naming
/// convention. Such names may be bound without appearing in the query.
pub fn is_subquery_variable_name(name: &str) -> bool {
    SUBQUERY_VARIABLE_PATTERN.is_match(name)
}

/// A query command, the root of an abstract query model tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryCommand {
    Select(SelectQuery),
    SetQuery(SetQuery),
}

impl QueryCommand {
    /// The limit and offset applied to this command's result rows
    pub fn limits(&self) -> Limit {
        match self {
            QueryCommand::Select(query) => query.limits,
            QueryCommand::SetQuery(query) => query.limits,
        }
    }

    /// The result columns of this command.
    ///
    /// A set query produces the columns of its left side.
    pub fn columns(&self) -> &[Column] {
        match self {
            QueryCommand::Select(query) => &query.columns,
            QueryCommand::SetQuery(query) => query.left.columns(),
        }
    }

    /// Functional update of the limit/offset pair.
    ///
    /// Returns the same root when the limits already match, otherwise a new
    /// root that shares every unaffected child of the original.
    pub fn with_limits(this: &Arc<Self>, limits: Limit) -> Arc<Self> {
        if this.limits() == limits {
            return Arc::clone(this);
        }
        Arc::new(match &**this {
            QueryCommand::Select(query) => {
                let mut query = query.clone();
                query.limits = limits;
                QueryCommand::Select(query)
            }
            QueryCommand::SetQuery(query) => {
                let mut query = query.clone();
                query.limits = limits;
                QueryCommand::SetQuery(query)
            }
        })
    }

    /// Functional update of the row limit, keeping the offset
    pub fn with_row_limit(this: &Arc<Self>, row_limit: i32) -> Arc<Self> {
        Self::with_limits(this, this.limits().with_row_limit(row_limit))
    }

    /// Functional update of the offset, keeping the row limit
    pub fn with_offset(this: &Arc<Self>, offset: i32) -> Arc<Self> {
        Self::with_limits(this, this.limits().with_offset(offset))
    }
}

/// A select query: one source selector, an optional constraint tree,
/// orderings, projected columns, and a limit/offset pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub source: Selector,
    pub constraint: Option<Arc<Constraint>>,
    pub orderings: Vec<Ordering>,
    pub columns: Vec<Column>,
    pub limits: Limit,
}

impl SelectQuery {
    /// Create a select over the given source with no constraint, no
    /// orderings, default columns, and no limit
    pub fn new(source: Selector) -> Self {
        Self {
            source,
            constraint: None,
            orderings: Vec::new(),
            columns: Vec::new(),
            limits: Limit::NONE,
        }
    }

    /// Set the constraint
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(Arc::new(constraint));
        self
    }

    /// Set the orderings
    pub fn with_orderings(mut self, orderings: Vec<Ordering>) -> Self {
        self.orderings = orderings;
        self
    }

    /// Set the projected columns
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Set the limit/offset pair
    pub fn with_limits(mut self, limits: Limit) -> Self {
        self.limits = limits;
        self
    }

    /// Wrap this select into a query command root
    pub fn into_command(self) -> Arc<QueryCommand> {
        Arc::new(QueryCommand::Select(self))
    }
}

/// A set query combining two commands with a set operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetQuery {
    pub left: Arc<QueryCommand>,
    pub right: Arc<QueryCommand>,
    pub operation: SetOperator,
    /// Keep duplicate rows (UNION ALL and friends)
    pub all: bool,
    pub limits: Limit,
}

impl SetQuery {
    pub fn new(left: Arc<QueryCommand>, operation: SetOperator, right: Arc<QueryCommand>) -> Self {
        Self {
            left,
            right,
            operation,
            all: false,
            limits: Limit::NONE,
        }
    }

    /// Keep duplicate rows
    pub fn all(mut self) -> Self {
        self.all = true;
        self
    }

    /// Wrap this set query into a query command root
    pub fn into_command(self) -> Arc<QueryCommand> {
        Arc::new(QueryCommand::SetQuery(self))
    }
}

/// Set operation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

/// A named selector: the node type the query draws items from, with an
/// optional alias used to qualify operands and columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub node_type: String,
    pub alias: Option<String>,
}

impl Selector {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            alias: None,
        }
    }

    /// Set the alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name operands and columns refer to this selector by
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.node_type)
    }
}

/// A constraint node in the query's filter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    And(Arc<Constraint>, Arc<Constraint>),
    Or(Arc<Constraint>, Arc<Constraint>),
    Not(Arc<Constraint>),
    Comparison(Comparison),
    PropertyExistence(PropertyExistence),
    SetCriteria(SetCriteria),
}

impl Constraint {
    pub fn and(self, other: Constraint) -> Constraint {
        Constraint::And(Arc::new(self), Arc::new(other))
    }

    pub fn or(self, other: Constraint) -> Constraint {
        Constraint::Or(Arc::new(self), Arc::new(other))
    }

    pub fn not(self) -> Constraint {
        Constraint::Not(Arc::new(self))
    }
}

/// A binary comparison between a dynamic operand (evaluated per item) and a
/// static operand (known before execution starts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub operand1: DynamicOperand,
    pub operator: Operator,
    pub operand2: StaticOperand,
}

impl Comparison {
    pub fn new(operand1: DynamicOperand, operator: Operator, operand2: StaticOperand) -> Self {
        Self {
            operand1,
            operator,
            operand2,
        }
    }
}

/// Constraint satisfied when the named property exists on an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyExistence {
    pub selector: Option<String>,
    pub property: String,
}

impl PropertyExistence {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            selector: None,
            property: property.into(),
        }
    }
}

/// Constraint satisfied when a dynamic operand's value is one of a set of
/// static operand values (IN-list; members may be subqueries)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetCriteria {
    pub operand: DynamicOperand,
    pub values: Vec<StaticOperand>,
}

impl SetCriteria {
    pub fn new(operand: DynamicOperand, values: Vec<StaticOperand>) -> Self {
        Self { operand, values }
    }
}

/// An operand evaluated against each candidate item during execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DynamicOperand {
    /// The value of a property on the selected item
    PropertyValue {
        selector: Option<String>,
        property: String,
    },
    /// The name of the selected item
    NodeName { selector: Option<String> },
    LowerCase(Box<DynamicOperand>),
    UpperCase(Box<DynamicOperand>),
}

impl DynamicOperand {
    pub fn property(property: impl Into<String>) -> Self {
        DynamicOperand::PropertyValue {
            selector: None,
            property: property.into(),
        }
    }

    pub fn node_name() -> Self {
        DynamicOperand::NodeName { selector: None }
    }

    pub fn lower_case(self) -> Self {
        DynamicOperand::LowerCase(Box::new(self))
    }

    pub fn upper_case(self) -> Self {
        DynamicOperand::UpperCase(Box::new(self))
    }
}

/// An operand whose value is fixed before execution: a literal, a bind
/// variable reference, or a nested subquery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StaticOperand {
    Literal(Value),
    BindVariable(String),
    Subquery(Arc<QueryCommand>),
}

impl StaticOperand {
    pub fn literal(value: impl Into<Value>) -> Self {
        StaticOperand::Literal(value.into())
    }

    pub fn bind_variable(name: impl Into<String>) -> Self {
        StaticOperand::BindVariable(name.into())
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Like,
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub operand: DynamicOperand,
    pub order: Order,
}

impl Ordering {
    pub fn ascending(operand: DynamicOperand) -> Self {
        Self {
            operand,
            order: Order::Ascending,
        }
    }

    pub fn descending(operand: DynamicOperand) -> Self {
        Self {
            operand,
            order: Order::Descending,
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Order {
    Ascending,
    Descending,
}

/// A projected result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub selector: Option<String>,
    pub property: String,
    /// Column name in the result; defaults to the property name
    pub column_name: Option<String>,
}

impl Column {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            selector: None,
            property: property.into(),
            column_name: None,
        }
    }

    /// Set the result column name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.column_name = Some(name.into());
        self
    }

    /// The name this column appears under in results
    pub fn name(&self) -> &str {
        self.column_name.as_deref().unwrap_or(&self.property)
    }
}

/// The limit and offset applied to a command's result rows.
///
/// A row limit of `i32::MAX` means unlimited. Negative values are carried
/// verbatim; validating them is the execution engine's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    row_limit: i32,
    offset: i32,
}

impl Limit {
    /// No limit and no offset
    pub const NONE: Limit = Limit {
        row_limit: i32::MAX,
        offset: 0,
    };

    pub fn new(row_limit: i32, offset: i32) -> Self {
        Self { row_limit, offset }
    }

    pub fn row_limit(&self) -> i32 {
        self.row_limit
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn is_unlimited(&self) -> bool {
        self.row_limit == i32::MAX && self.offset == 0
    }

    pub fn is_offset(&self) -> bool {
        self.offset > 0
    }

    /// Copy with a different row limit
    pub fn with_row_limit(self, row_limit: i32) -> Limit {
        Limit {
            row_limit,
            ..self
        }
    }

    /// Copy with a different offset
    pub fn with_offset(self, offset: i32) -> Limit {
        Limit { offset, ..self }
    }
}

impl Default for Limit {
    fn default() -> Self {
        Limit::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_command() -> Arc<QueryCommand> {
        SelectQuery::new(Selector::new("widget"))
            .with_constraint(Constraint::Comparison(Comparison::new(
                DynamicOperand::property("color"),
                Operator::EqualTo,
                StaticOperand::bind_variable("colorVar"),
            )))
            .with_columns(vec![Column::new("color")])
            .into_command()
    }

    #[test]
    fn test_with_limits_is_noop_for_equal_value() {
        let command = sample_command();
        let unchanged = QueryCommand::with_row_limit(&command, i32::MAX);
        assert!(Arc::ptr_eq(&command, &unchanged));
    }

    #[test]
    fn test_with_limits_shares_unaffected_substructure() {
        let command = sample_command();
        let limited = QueryCommand::with_row_limit(&command, 10);
        assert!(!Arc::ptr_eq(&command, &limited));
        assert_eq!(limited.limits().row_limit(), 10);

        let (QueryCommand::Select(before), QueryCommand::Select(after)) = (&*command, &*limited)
        else {
            panic!("expected select queries");
        };
        let (Some(before_constraint), Some(after_constraint)) =
            (&before.constraint, &after.constraint)
        else {
            panic!("expected constraints");
        };
        assert!(Arc::ptr_eq(before_constraint, after_constraint));
    }

    #[test]
    fn test_with_offset_keeps_row_limit() {
        let command = sample_command();
        let limited = QueryCommand::with_row_limit(&command, 7);
        let offsetted = QueryCommand::with_offset(&limited, 3);
        assert_eq!(offsetted.limits().row_limit(), 7);
        assert_eq!(offsetted.limits().offset(), 3);
    }

    #[test]
    fn test_subquery_variable_names() {
        assert!(is_subquery_variable_name("__subquery1"));
        assert!(is_subquery_variable_name("__subquery"));
        assert!(!is_subquery_variable_name("subquery1"));
        assert!(!is_subquery_variable_name("__subqueryX"));
    }

    #[test]
    fn test_set_query_columns_come_from_left_side() {
        let left = sample_command();
        let right = SelectQuery::new(Selector::new("widget"))
            .with_columns(vec![Column::new("size")])
            .into_command();
        let union = SetQuery::new(left, SetOperator::Union, right).into_command();
        assert_eq!(union.columns()[0].name(), "color");
    }
}
