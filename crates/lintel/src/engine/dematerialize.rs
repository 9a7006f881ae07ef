use super::Engine;
use crate::Result;

use lintel_core::{
    bail, err,
    stmt::{Object, Row, Value},
};

impl Engine<'_> {
    /// Flattens an object into a row of its hierarchy's table, in column
    /// order. The discriminator column always receives the concrete model's
    /// own discriminator value.
    pub(crate) fn dematerialize(&self, object: &Object) -> Result<(String, Row)> {
        let Some(ty) = object.model() else {
            bail!("a nested value object cannot be stored on its own");
        };

        let model = self.schema.model(ty);
        let table = self.schema.table_for(ty);
        let mut row = Row::new();

        for db_column in &table.columns {
            let Some(column) = model.columns().find(|column| column.name == db_column.name) else {
                row.insert(db_column.name.clone(), Value::Null);
                continue;
            };

            let value = match (&model.discriminator_value, column.discriminator) {
                (Some(value), true) => value.clone(),
                _ => object.get_path(&column.path).cloned().unwrap_or_default(),
            };

            if value.is_null() && !column.nullable {
                bail!("`{}.{}` is not nullable", model.name, column.path);
            }

            let stored = self
                .schema
                .converters
                .to_storage(value, &column.ty, &column.stored_ty())
                .map_err(|e| e.context(err!("writing `{}.{}`", model.name, column.path)))?;

            row.insert(db_column.name.clone(), stored);
        }

        Ok((table.name.clone(), row))
    }

    /// Picks the primary key columns of `object`'s model out of its
    /// dematerialized row.
    pub(crate) fn primary_key(&self, object: &Object, row: &Row) -> Result<Row> {
        let Some(ty) = object.model() else {
            bail!("a nested value object has no primary key");
        };

        let model = self.schema.model(ty);
        let mut key = Row::new();

        for column in model.columns().filter(|column| column.primary_key) {
            key.insert(column.name.clone(), row.get(&column.name).clone());
        }

        if key.is_empty() {
            bail!("`{}` has no primary key", model.name);
        }

        Ok(key)
    }
}
