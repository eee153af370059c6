// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! Readable rendering of the abstract query model.
//!
//! Produces query-language-like text, used for the client-facing model
//! representation and in plan/log output. The rendering is for human eyes;
//! it is not parsed back.

use super::{
    Column, Comparison, Constraint, DynamicOperand, Limit, Operator, Order, Ordering,
    PropertyExistence, QueryCommand, Selector, SetCriteria, SetOperator, SetQuery, SelectQuery,
    StaticOperand,
};
use std::fmt;

impl fmt::Display for QueryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryCommand::Select(query) => query.fmt(f),
            QueryCommand::SetQuery(query) => query.fmt(f),
        }
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.columns.is_empty() {
            write!(f, "*")?;
        } else {
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                column.fmt(f)?;
            }
        }
        write!(f, " FROM {}", self.source)?;
        if let Some(constraint) = &self.constraint {
            write!(f, " WHERE {}", constraint)?;
        }
        if !self.orderings.is_empty() {
            write!(f, " ORDER BY ")?;
            for (i, ordering) in self.orderings.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                ordering.fmt(f)?;
            }
        }
        if !self.limits.is_unlimited() {
            write!(f, " {}", self.limits)?;
        }
        Ok(())
    }
}

impl fmt::Display for SetQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} ({})", self.left, self.operation, self.right)?;
        if self.all {
            write!(f, " ALL")?;
        }
        if !self.limits.is_unlimited() {
            write!(f, " {}", self.limits)?;
        }
        Ok(())
    }
}

impl fmt::Display for SetOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetOperator::Union => write!(f, "UNION"),
            SetOperator::Intersect => write!(f, "INTERSECT"),
            SetOperator::Except => write!(f, "EXCEPT"),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {}", self.node_type, alias),
            None => write!(f, "{}", self.node_type),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::And(left, right) => write!(f, "({} AND {})", left, right),
            Constraint::Or(left, right) => write!(f, "({} OR {})", left, right),
            Constraint::Not(inner) => write!(f, "NOT {}", inner),
            Constraint::Comparison(comparison) => comparison.fmt(f),
            Constraint::PropertyExistence(existence) => existence.fmt(f),
            Constraint::SetCriteria(criteria) => criteria.fmt(f),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.operand1, self.operator, self.operand2)
    }
}

impl fmt::Display for PropertyExistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(selector) => write!(f, "{}.{} IS NOT NULL", selector, self.property),
            None => write!(f, "{} IS NOT NULL", self.property),
        }
    }
}

impl fmt::Display for SetCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IN (", self.operand)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            value.fmt(f)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for DynamicOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicOperand::PropertyValue { selector, property } => match selector {
                Some(selector) => write!(f, "{}.{}", selector, property),
                None => write!(f, "{}", property),
            },
            DynamicOperand::NodeName { selector } => match selector {
                Some(selector) => write!(f, "NAME({})", selector),
                None => write!(f, "NAME()"),
            },
            DynamicOperand::LowerCase(inner) => write!(f, "LOWER({})", inner),
            DynamicOperand::UpperCase(inner) => write!(f, "UPPER({})", inner),
        }
    }
}

impl fmt::Display for StaticOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticOperand::Literal(value) => value.fmt(f),
            StaticOperand::BindVariable(name) => write!(f, "${}", name),
            StaticOperand::Subquery(subquery) => write!(f, "({})", subquery),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::EqualTo => "=",
            Operator::NotEqualTo => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::Like => "LIKE",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.operand, self.order)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Ascending => write!(f, "ASC"),
            Order::Descending => write!(f, "DESC"),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(selector) => write!(f, "{}.{}", selector, self.property)?,
            None => write!(f, "{}", self.property)?,
        }
        if let Some(name) = &self.column_name {
            write!(f, " AS {}", name)?;
        }
        Ok(())
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.row_limit() != i32::MAX {
            write!(f, "LIMIT {}", self.row_limit())?;
            if self.is_offset() {
                write!(f, " ")?;
            }
        }
        if self.is_offset() {
            write!(f, "OFFSET {}", self.offset())?;
        }
        Ok(())
    }
}
