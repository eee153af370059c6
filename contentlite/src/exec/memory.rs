// Copyright (c) 2024-2025 ContentLite Contributors.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory reference engine.
//!
//! Evaluates query models directly against a collection of content items.
//! It exists so the coordinator can be exercised end-to-end without an
//! external system; it keeps the full engine contract: single-flight
//! `run`, cooperative cancellation checked at item boundaries, problems
//! for unbound variables and unpopulated columns, and a textual plan for
//! every run. Negative limits and offsets, which the coordinator passes
//! through untouched, are treated here as zero rows and zero skip.

use crate::coordinator::error::QueryError;
use crate::exec::engine::{ExecutionHandle, QueryEngine, RunOutcome};
use crate::exec::problems::Problems;
use crate::exec::results::{EngineResults, ResultRow};
use crate::model::{
    Constraint, DynamicOperand, Operator, Order, QueryCommand, SelectQuery, SetOperator, SetQuery,
    StaticOperand, Value,
};
use crate::plan::PlanHints;
use log::trace;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering as AtomicOrdering};
use std::sync::Arc;
use uuid::Uuid;

/// One item in the repository: a named, typed node with properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub name: String,
    pub node_type: String,
    /// System content is excluded from results unless the hints ask for it
    pub system: bool,
    pub properties: HashMap<String, Value>,
}

impl ContentItem {
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            node_type: node_type.into(),
            system: false,
            properties: HashMap::new(),
        }
    }

    /// Set a property value
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Mark this item as system content
    pub fn with_system(mut self, system: bool) -> Self {
        self.system = system;
        self
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// A flat collection of content items queries are evaluated against
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    items: Vec<ContentItem>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: ContentItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Engine that evaluates models against an in-memory repository
pub struct MemoryEngine {
    repository: Arc<MemoryRepository>,
}

impl MemoryEngine {
    pub fn new(repository: MemoryRepository) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn repository(&self) -> &MemoryRepository {
        &self.repository
    }
}

impl QueryEngine for MemoryEngine {
    fn create_execution(
        &self,
        model: &Arc<QueryCommand>,
        hints: PlanHints,
        variables: &HashMap<String, Value>,
    ) -> Result<Arc<dyn ExecutionHandle>, QueryError> {
        // Creation only snapshots inputs; all work happens in run().
        Ok(Arc::new(MemoryExecution {
            repository: Arc::clone(&self.repository),
            model: Arc::clone(model),
            hints,
            variables: variables.clone(),
            state: AtomicU8::new(CREATED),
            outcome: OnceCell::new(),
        }))
    }
}

const CREATED: u8 = 0;
const RUNNING: u8 = 1;
const COMPLETED: u8 = 2;
const CANCELLED: u8 = 3;

/// One execution of a model against the repository
pub struct MemoryExecution {
    repository: Arc<MemoryRepository>,
    model: Arc<QueryCommand>,
    hints: PlanHints,
    variables: HashMap<String, Value>,
    state: AtomicU8,
    outcome: OnceCell<Result<RunOutcome, QueryError>>,
}

impl ExecutionHandle for MemoryExecution {
    fn run(&self) -> Result<RunOutcome, QueryError> {
        // First caller computes; racing callers share the outcome.
        self.outcome.get_or_init(|| self.compute()).clone()
    }

    fn cancel(&self) -> bool {
        self.state
            .compare_exchange(
                CREATED,
                CANCELLED,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            )
            .is_ok()
            || self
                .state
                .compare_exchange(
                    RUNNING,
                    CANCELLED,
                    AtomicOrdering::SeqCst,
                    AtomicOrdering::SeqCst,
                )
                .is_ok()
    }
}

impl MemoryExecution {
    fn compute(&self) -> Result<RunOutcome, QueryError> {
        if self
            .state
            .compare_exchange(
                CREATED,
                RUNNING,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            )
            .is_err()
        {
            // Cancelled before the run began.
            return Ok(RunOutcome::Cancelled);
        }
        trace!("running: {}", self.model);

        let columns = column_names(&self.model);
        let mut results = EngineResults::new(columns).with_plan(render_plan(&self.model));
        if self.hints.plan_only {
            return self.finish(results);
        }

        let mut problems = Problems::new();
        let tuples = match self.eval_command(&self.model, &mut problems)? {
            Some(tuples) => tuples,
            None => return Ok(RunOutcome::Cancelled),
        };

        warn_on_unpopulated_columns(&results.columns, &tuples, &mut problems);
        results.rows = tuples
            .into_iter()
            .map(|tuple| ResultRow::from_columns(&results.columns, tuple))
            .collect();
        results.problems = problems;
        self.finish(results)
    }

    /// Move to the completed state unless cancellation won the race
    fn finish(&self, results: EngineResults) -> Result<RunOutcome, QueryError> {
        if self
            .state
            .compare_exchange(
                RUNNING,
                COMPLETED,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            )
            .is_err()
        {
            return Ok(RunOutcome::Cancelled);
        }
        Ok(RunOutcome::Complete(results))
    }

    fn is_cancelled(&self) -> bool {
        self.state.load(AtomicOrdering::SeqCst) == CANCELLED
    }

    /// Evaluate a command into positional value tuples.
    ///
    /// `Ok(None)` means cancellation was observed mid-evaluation.
    fn eval_command(
        &self,
        command: &QueryCommand,
        problems: &mut Problems,
    ) -> Result<Option<Vec<Vec<Value>>>, QueryError> {
        match command {
            QueryCommand::Select(query) => self.eval_select(query, problems),
            QueryCommand::SetQuery(query) => self.eval_set_query(query, problems),
        }
    }

    fn eval_select(
        &self,
        query: &SelectQuery,
        problems: &mut Problems,
    ) -> Result<Option<Vec<Vec<Value>>>, QueryError> {
        let mut matched: Vec<&ContentItem> = Vec::new();
        for item in self.repository.items() {
            if self.is_cancelled() {
                return Ok(None);
            }
            if item.node_type != query.source.node_type {
                continue;
            }
            if item.system && !self.hints.include_system_content {
                continue;
            }
            let keep = match &query.constraint {
                Some(constraint) => match self.eval_constraint(constraint, item, problems)? {
                    Some(keep) => keep,
                    None => return Ok(None),
                },
                None => true,
            };
            if keep {
                matched.push(item);
            }
        }

        if !query.orderings.is_empty() {
            matched.sort_by(|a, b| {
                let mut ordering = CmpOrdering::Equal;
                for term in &query.orderings {
                    let left = eval_dynamic(a, &term.operand);
                    let right = eval_dynamic(b, &term.operand);
                    ordering = left.cmp_for_ordering(&right);
                    if term.order == Order::Descending {
                        ordering = ordering.reverse();
                    }
                    if ordering != CmpOrdering::Equal {
                        break;
                    }
                }
                ordering
            });
        }

        let offset = query.limits.offset().max(0) as usize;
        let row_limit = query.limits.row_limit().max(0) as usize;
        let mut tuples = Vec::new();
        for item in matched.into_iter().skip(offset).take(row_limit) {
            if self.is_cancelled() {
                return Ok(None);
            }
            tuples.push(project(query, item));
        }
        Ok(Some(tuples))
    }

    fn eval_set_query(
        &self,
        query: &SetQuery,
        problems: &mut Problems,
    ) -> Result<Option<Vec<Vec<Value>>>, QueryError> {
        let Some(left) = self.eval_command(&query.left, problems)? else {
            return Ok(None);
        };
        let Some(right) = self.eval_command(&query.right, problems)? else {
            return Ok(None);
        };

        let mut tuples: Vec<Vec<Value>> = match query.operation {
            SetOperator::Union => {
                let mut combined = left;
                combined.extend(right);
                combined
            }
            SetOperator::Intersect => left
                .into_iter()
                .filter(|tuple| right.contains(tuple))
                .collect(),
            SetOperator::Except => left
                .into_iter()
                .filter(|tuple| !right.contains(tuple))
                .collect(),
        };
        if !query.all {
            tuples = distinct(tuples);
        }

        let offset = query.limits.offset().max(0) as usize;
        let row_limit = query.limits.row_limit().max(0) as usize;
        Ok(Some(
            tuples.into_iter().skip(offset).take(row_limit).collect(),
        ))
    }

    /// Evaluate a constraint for one item; `Ok(None)` means cancelled
    fn eval_constraint(
        &self,
        constraint: &Constraint,
        item: &ContentItem,
        problems: &mut Problems,
    ) -> Result<Option<bool>, QueryError> {
        match constraint {
            Constraint::And(left, right) => {
                match self.eval_constraint(left, item, problems)? {
                    Some(true) => self.eval_constraint(right, item, problems),
                    other => Ok(other),
                }
            }
            Constraint::Or(left, right) => match self.eval_constraint(left, item, problems)? {
                Some(false) => self.eval_constraint(right, item, problems),
                other => Ok(other),
            },
            Constraint::Not(inner) => {
                Ok(self.eval_constraint(inner, item, problems)?.map(|b| !b))
            }
            Constraint::Comparison(comparison) => {
                let Some(expected) = self.resolve_static(&comparison.operand2, problems)? else {
                    return Ok(None);
                };
                let actual = eval_dynamic(item, &comparison.operand1);
                Ok(Some(expected.first().is_some_and(|expected| {
                    apply_operator(&actual, comparison.operator, expected)
                })))
            }
            Constraint::PropertyExistence(existence) => Ok(Some(
                item.property(&existence.property)
                    .is_some_and(|v| !v.is_null()),
            )),
            Constraint::SetCriteria(criteria) => {
                let actual = eval_dynamic(item, &criteria.operand);
                let mut found = false;
                for operand in &criteria.values {
                    let Some(values) = self.resolve_static(operand, problems)? else {
                        return Ok(None);
                    };
                    if values
                        .iter()
                        .any(|value| apply_operator(&actual, Operator::EqualTo, value))
                    {
                        found = true;
                        break;
                    }
                }
                Ok(Some(found))
            }
        }
    }

    /// Resolve a static operand to the value set it stands for.
    ///
    /// An unbound variable records an error problem and resolves to the
    /// empty set, which no comparison matches.
    fn resolve_static(
        &self,
        operand: &StaticOperand,
        problems: &mut Problems,
    ) -> Result<Option<Vec<Value>>, QueryError> {
        match operand {
            StaticOperand::Literal(value) => Ok(Some(vec![value.clone()])),
            StaticOperand::BindVariable(name) => match self.variables.get(name) {
                Some(value) => Ok(Some(vec![value.clone()])),
                None => {
                    problems.add_error(format!("no value bound to variable '${}'", name));
                    Ok(Some(Vec::new()))
                }
            },
            StaticOperand::Subquery(subquery) => {
                let Some(tuples) = self.eval_command(subquery, problems)? else {
                    return Ok(None);
                };
                Ok(Some(
                    tuples
                        .into_iter()
                        .filter_map(|tuple| tuple.into_iter().next())
                        .collect(),
                ))
            }
        }
    }
}

/// Value of a dynamic operand for one item
fn eval_dynamic(item: &ContentItem, operand: &DynamicOperand) -> Value {
    match operand {
        DynamicOperand::PropertyValue { property, .. } => {
            item.property(property).cloned().unwrap_or(Value::Null)
        }
        DynamicOperand::NodeName { .. } => Value::Name(item.name.clone()),
        DynamicOperand::LowerCase(inner) => match eval_dynamic(item, inner).as_text() {
            Some(text) => Value::String(text.to_lowercase()),
            None => Value::Null,
        },
        DynamicOperand::UpperCase(inner) => match eval_dynamic(item, inner).as_text() {
            Some(text) => Value::String(text.to_uppercase()),
            None => Value::Null,
        },
    }
}

fn apply_operator(actual: &Value, operator: Operator, expected: &Value) -> bool {
    match operator {
        Operator::Like => match (actual.as_text(), expected.as_text()) {
            (Some(text), Some(pattern)) => like_matches(text, pattern),
            _ => false,
        },
        Operator::EqualTo => actual.compare(expected) == Some(CmpOrdering::Equal),
        Operator::NotEqualTo => actual
            .compare(expected)
            .is_some_and(|o| o != CmpOrdering::Equal),
        Operator::LessThan => actual
            .compare(expected)
            .is_some_and(|o| o == CmpOrdering::Less),
        Operator::LessThanOrEqualTo => actual
            .compare(expected)
            .is_some_and(|o| o != CmpOrdering::Greater),
        Operator::GreaterThan => actual
            .compare(expected)
            .is_some_and(|o| o == CmpOrdering::Greater),
        Operator::GreaterThanOrEqualTo => actual
            .compare(expected)
            .is_some_and(|o| o != CmpOrdering::Less),
    }
}

/// LIKE with `%` (any run) and `_` (any single character) wildcards
fn like_matches(text: &str, pattern: &str) -> bool {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            ch => regex.push_str(&regex::escape(&ch.to_string())),
        }
    }
    regex.push('$');
    Regex::new(&regex).map(|re| re.is_match(text)).unwrap_or(false)
}

/// Project one matched item onto the query's columns.
///
/// With no explicit columns, the item's name is projected under a single
/// `name` column.
fn project(query: &SelectQuery, item: &ContentItem) -> Vec<Value> {
    if query.columns.is_empty() {
        return vec![Value::Name(item.name.clone())];
    }
    query
        .columns
        .iter()
        .map(|column| {
            item.property(&column.property)
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect()
}

fn column_names(command: &QueryCommand) -> Vec<String> {
    match command {
        QueryCommand::Select(query) => {
            if query.columns.is_empty() {
                vec!["name".to_string()]
            } else {
                query
                    .columns
                    .iter()
                    .map(|column| column.name().to_string())
                    .collect()
            }
        }
        QueryCommand::SetQuery(query) => column_names(&query.left),
    }
}

fn warn_on_unpopulated_columns(
    columns: &[String],
    tuples: &[Vec<Value>],
    problems: &mut Problems,
) {
    if tuples.is_empty() {
        return;
    }
    for (index, column) in columns.iter().enumerate() {
        let all_null = tuples
            .iter()
            .all(|tuple| tuple.get(index).map_or(true, Value::is_null));
        if all_null {
            problems.add_warning(format!(
                "column '{}' is not present on any matched item",
                column
            ));
        }
    }
}

fn distinct(tuples: Vec<Vec<Value>>) -> Vec<Vec<Value>> {
    let mut unique: Vec<Vec<Value>> = Vec::with_capacity(tuples.len());
    for tuple in tuples {
        if !unique.contains(&tuple) {
            unique.push(tuple);
        }
    }
    unique
}

/// Render the textual operator tree reported alongside every run
fn render_plan(command: &QueryCommand) -> String {
    let mut lines = Vec::new();
    plan_lines(command, 0, &mut lines);
    lines.join("\n")
}

fn plan_lines(command: &QueryCommand, depth: usize, lines: &mut Vec<String>) {
    match command {
        QueryCommand::Select(query) => {
            let mut depth = depth;
            lines.push(format!(
                "{}Project [{}]",
                pad(depth),
                column_names(command).join(", ")
            ));
            depth += 1;
            if !query.limits.is_unlimited() {
                lines.push(format!(
                    "{}Limit [{} rows, offset {}]",
                    pad(depth),
                    query.limits.row_limit(),
                    query.limits.offset()
                ));
                depth += 1;
            }
            if !query.orderings.is_empty() {
                let terms: Vec<String> = query.orderings.iter().map(|o| o.to_string()).collect();
                lines.push(format!("{}Sort [{}]", pad(depth), terms.join(", ")));
                depth += 1;
            }
            if let Some(constraint) = &query.constraint {
                lines.push(format!("{}Filter [{}]", pad(depth), constraint));
                depth += 1;
            }
            lines.push(format!("{}Access [{}]", pad(depth), query.source));
        }
        QueryCommand::SetQuery(query) => {
            let mut depth = depth;
            if !query.limits.is_unlimited() {
                lines.push(format!(
                    "{}Limit [{} rows, offset {}]",
                    pad(depth),
                    query.limits.row_limit(),
                    query.limits.offset()
                ));
                depth += 1;
            }
            let all = if query.all { " all" } else { "" };
            lines.push(format!("{}{}{}", pad(depth), query.operation, all));
            plan_lines(&query.left, depth + 1, lines);
            plan_lines(&query.right, depth + 1, lines);
        }
    }
}

fn pad(depth: usize) -> String {
    "  ".repeat(depth)
}
