//! Fixture wiring a session and the reference engine to sample content

use contentlite::{
    Column, Comparison, Constraint, ContentItem, DynamicOperand, MemoryEngine, MemoryRepository,
    Operator, Ordering, PlanHints, Query, QueryCommand, QueryContext, QueryEngine, SelectQuery,
    Selector, Session, StaticOperand,
};
use std::sync::Arc;

/// Session plus engine over a small widget data set.
///
/// Widgets (ordered by name): alpha (red, 10), beta (green, 4),
/// delta (blue, 2), gamma (red, 7), plus one system item `proto` (red)
/// that only shows up when system content is included.
pub struct TestFixture {
    pub session: Arc<Session>,
    pub engine: Arc<MemoryEngine>,
}

impl TestFixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut repository = MemoryRepository::new();
        repository.add(
            ContentItem::new("alpha", "widget")
                .with_property("color", "red")
                .with_property("weight", 10i64),
        );
        repository.add(
            ContentItem::new("beta", "widget")
                .with_property("color", "green")
                .with_property("weight", 4i64),
        );
        repository.add(
            ContentItem::new("delta", "widget")
                .with_property("color", "blue")
                .with_property("weight", 2i64),
        );
        repository.add(
            ContentItem::new("gamma", "widget")
                .with_property("color", "red")
                .with_property("weight", 7i64),
        );
        repository.add(
            ContentItem::new("proto", "widget")
                .with_system(true)
                .with_property("color", "red"),
        );

        Self {
            session: Arc::new(Session::new()),
            engine: Arc::new(MemoryEngine::new(repository)),
        }
    }

    /// Create a query against this fixture's session and engine
    pub fn query(&self, statement: &str, model: Arc<QueryCommand>) -> Query {
        let context: Arc<dyn QueryContext> = self.session.clone();
        let engine: Arc<dyn QueryEngine> = self.engine.clone();
        Query::new(context, engine, statement, "sql", model, PlanHints::new())
    }

    /// The canonical bound-variable query: widgets filtered by color
    pub fn color_query(&self) -> Query {
        self.query("find items where color = $colorVar", color_model())
    }
}

/// Model for "find items where color = $colorVar", projecting color and
/// weight, ordered by item name
pub fn color_model() -> Arc<QueryCommand> {
    SelectQuery::new(Selector::new("widget"))
        .with_constraint(Constraint::Comparison(Comparison::new(
            DynamicOperand::property("color"),
            Operator::EqualTo,
            StaticOperand::bind_variable("colorVar"),
        )))
        .with_columns(vec![Column::new("color"), Column::new("weight")])
        .with_orderings(vec![Ordering::ascending(DynamicOperand::node_name())])
        .into_command()
}
