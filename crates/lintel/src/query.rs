//! Query requests issued through [`Db::all`](crate::Db::all).

use lintel_core::schema::ModelId;
use lintel_core::stmt::{Expr, LoadPath};

/// Selects instances of a model, optionally filtered, and names the
/// navigation paths to load eagerly with them.
///
/// Results are instances of the queried model or any of its subtypes; each
/// object reports its actual runtime type.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    model: ModelId,
    filter: Option<Expr>,
    load_with: Vec<LoadPath>,
    limit: Option<usize>,
}

impl Query {
    pub fn new(model: ModelId) -> Self {
        Self {
            model,
            filter: None,
            load_with: vec![],
            limit: None,
        }
    }

    /// Adds a predicate. Repeated calls are combined with `&&`.
    pub fn filter(mut self, expr: impl Into<Expr>) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Expr::and(existing, expr),
            None => expr.into(),
        });
        self
    }

    /// Requests eager loading of the navigation chain `path`.
    pub fn load_with(mut self, path: impl Into<LoadPath>) -> Self {
        self.load_with.push(path.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn filter_expr(&self) -> Option<&Expr> {
        self.filter.as_ref()
    }

    pub fn load_paths(&self) -> &[LoadPath] {
        &self.load_with
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }
}
