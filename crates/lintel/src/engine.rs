mod dematerialize;
mod load_with;
mod materialize;
mod translate;

use crate::{db::Config, Query, Result};

use lintel_core::{
    driver::{operation, Driver},
    schema::{Column, Model, ModelId},
    stmt::{FieldPath, Filter, Object, Row, Value},
    Error, Schema,
};
use tracing::debug;

/// Executes queries for one [`Db`](crate::Db) handle.
///
/// The engine borrows the handle's frozen schema and never mutates it, so any
/// number of engines may run concurrently.
pub(crate) struct Engine<'a> {
    pub(crate) schema: &'a std::sync::Arc<Schema>,
    pub(crate) driver: &'a dyn Driver,
    pub(crate) config: &'a Config,
}

impl Engine<'_> {
    pub(crate) async fn exec_query(&self, query: &Query) -> Result<Vec<Object>> {
        let model = query.model();

        let mut filter = self.scope(model)?;
        if let Some(expr) = query.filter_expr() {
            filter = Filter::and([filter, self.translate(model, expr)?]);
        }

        let rows = self.fetch(model, filter, query.limit_value()).await?;

        let mut objects = rows
            .iter()
            .map(|row| self.materialize(row, model))
            .collect::<Result<Vec<_>>>()?;

        if !query.load_paths().is_empty() {
            let mut plan = load_with::Plan::new(self.schema, model, query.load_paths())?;
            plan.exec(self, &mut objects).await?;
        }

        Ok(objects)
    }

    /// Fetches the rows of `model`'s table matching `filter`.
    async fn fetch(&self, model: ModelId, filter: Filter, limit: Option<usize>) -> Result<Vec<Row>> {
        let table = self.schema.model(model).table.clone();
        debug!(table = %table, ?filter, "fetch");

        let response = self
            .driver
            .exec(
                &self.schema.db,
                operation::Fetch {
                    table,
                    filter,
                    limit,
                }
                .into(),
            )
            .await?;

        response.rows.into_values()
    }

    /// Restricts a fetch of `model`'s table to instances of `model`. Fetches
    /// at a hierarchy root are unrestricted.
    fn scope(&self, model: ModelId) -> Result<Filter> {
        if self.schema.model(model).is_root() {
            Ok(Filter::True)
        } else {
            self.discriminator_filter(model)
        }
    }

    /// `discriminator IN SubtypeSet(ty)`, with values in parameter form.
    fn discriminator_filter(&self, ty: ModelId) -> Result<Filter> {
        let hierarchy = self.schema.hierarchy(ty);

        let Some(discriminator) = &hierarchy.discriminator else {
            return Err(Error::invalid_expression(format!(
                "`{}` cannot be distinguished from other types in table `{}`; the hierarchy has no discriminator",
                self.schema.model(ty).name,
                hierarchy.table
            )));
        };

        let storage_ty = discriminator.storage_ty.to_stmt();
        let values = self
            .schema
            .subtype_values(ty)
            .into_iter()
            .map(|value| {
                self.schema
                    .converters
                    .to_param(value.clone(), &discriminator.ty, &storage_ty)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Filter::in_list(discriminator.column.clone(), values))
    }

    /// Reads key values off an object, converted to the types of the columns
    /// they are matched against. Returns `None` when any part is null.
    fn key_values(
        &self,
        object: &Object,
        columns: &[&Column],
        matched: &[&Column],
    ) -> Result<Option<Vec<Value>>> {
        let mut key = Vec::with_capacity(columns.len());

        for (column, other) in columns.iter().zip(matched) {
            let value = match object.get_path(&column.path) {
                Some(value) if !value.is_null() => value.clone(),
                _ => return Ok(None),
            };

            key.push(self.schema.converters.convert(value, &column.ty, &other.ty)?);
        }

        Ok(Some(key))
    }
}

/// Resolves the stored key columns of `model`.
fn key_columns<'m>(model: &'m Model, keys: &[FieldPath]) -> Result<Vec<&'m Column>> {
    keys.iter()
        .map(|path| {
            model.column(path).ok_or_else(|| {
                Error::invalid_mapping(format!(
                    "`{path}` is not a stored column of `{}`",
                    model.name
                ))
            })
        })
        .collect()
}
