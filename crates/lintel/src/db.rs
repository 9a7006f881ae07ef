mod builder;
pub use builder::{Builder, CastScope, UnresolvedDiscriminator};

use crate::{engine::Engine, Query, Result};

use lintel_core::{
    bail,
    driver::{operation, Driver},
    schema::ModelId,
    stmt::{Expr, Filter, Object, Row},
    Schema,
};

use std::sync::Arc;

/// Session policies, fixed when the [`Db`] is built.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Config {
    pub(crate) unresolved_discriminator: UnresolvedDiscriminator,
    pub(crate) cast_scope: CastScope,
}

/// A handle pairing a frozen [`Schema`] with the row source queries run
/// against. Cloning is cheap and clones share both.
#[derive(Debug, Clone)]
pub struct Db {
    pub(crate) schema: Arc<Schema>,
    pub(crate) driver: Arc<dyn Driver>,
    pub(crate) config: Config,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Execute a query, returning every matching object
    pub async fn all(&self, query: &Query) -> Result<Vec<Object>> {
        self.engine().exec_query(query).await
    }

    /// Execute a query, returning the first matching object
    pub async fn first(&self, query: &Query) -> Result<Option<Object>> {
        let query = query.clone().limit(1);
        Ok(self.all(&query).await?.into_iter().next())
    }

    /// Stores `object` as a new row of its model's table.
    pub async fn insert(&self, object: &Object) -> Result<()> {
        let (table, row) = self.engine().dematerialize(object)?;

        self.driver
            .exec(&self.schema.db, operation::Insert { table, row }.into())
            .await?;

        Ok(())
    }

    /// Rewrites the stored row of `object`, found by its primary key.
    ///
    /// The row is written for the object's concrete model, discriminator
    /// included, whatever type it was queried at.
    pub async fn update(&self, object: &Object) -> Result<()> {
        let engine = self.engine();
        let (table, row) = engine.dematerialize(object)?;
        let key = engine.primary_key(object, &row)?;

        let count = self
            .driver
            .exec(&self.schema.db, operation::UpdateByKey { table, key, row }.into())
            .await?
            .rows
            .into_count()?;

        if count == 0 {
            let model = object.model().map(|ty| self.schema.model(ty).name.as_str());
            bail!("no stored `{}` matches the key of the updated object", model.unwrap_or_default());
        }

        Ok(())
    }

    /// Drops all rows and recreates the tables derived from the schema.
    pub async fn reset_db(&self) -> Result<()> {
        self.driver.reset_db(&self.schema.db).await
    }

    /// Compiles a predicate over `model` into the storage filter a fetch
    /// would use, without the model's own discriminator scope.
    pub fn translate(&self, model: ModelId, expr: &Expr) -> Result<Filter> {
        self.engine().translate(model, expr)
    }

    /// Materializes a raw row as it would be when querying `model`.
    pub fn materialize(&self, model: ModelId, row: &Row) -> Result<Object> {
        self.engine().materialize(row, model)
    }

    fn engine(&self) -> Engine<'_> {
        Engine {
            schema: &self.schema,
            driver: self.driver.as_ref(),
            config: &self.config,
        }
    }
}
