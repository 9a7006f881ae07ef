use super::Engine;
use crate::{db::UnresolvedDiscriminator, Result};

use lintel_core::{
    err,
    schema::ModelId,
    stmt::{Object, Row, Value},
    Error,
};
use tracing::{trace, warn};

impl Engine<'_> {
    /// Turns a raw row of `queried`'s table into an instance of the concrete
    /// model its discriminator names.
    ///
    /// Every stored column of the concrete model is bound, nested value
    /// objects included. Navigation properties are left unset.
    pub(crate) fn materialize(&self, row: &Row, queried: ModelId) -> Result<Object> {
        let (ty, discriminator) = self.resolve_row_type(row, queried)?;

        if !self.schema.is_subtype(ty, queried) {
            return Err(Error::invalid_result(format!(
                "row of `{}` is not an instance of the queried type `{}`",
                self.schema.model(ty).name,
                self.schema.model(queried).name
            )));
        }

        let model = self.schema.model(ty);
        let mut object = Object::new(ty);

        for column in model.columns() {
            let stored = row.get(&column.name).clone();

            if stored.is_null() && !column.nullable {
                return Err(Error::invalid_result(format!(
                    "column `{}` of `{}` is not nullable but the row holds NULL",
                    column.name, model.name
                )));
            }

            // Already converted while resolving; unset when that failed
            if column.discriminator {
                if let Some(value) = &discriminator {
                    object.set_path(&column.path, value.clone());
                }
                continue;
            }

            let value = self
                .schema
                .converters
                .from_storage(stored, &column.stored_ty(), &column.ty)
                .map_err(|e| e.context(err!("reading column `{}` of `{}`", column.name, model.name)))?;

            object.set_path(&column.path, value);
        }

        trace!(model = %model.name, fields = object.len(), "materialized row");
        Ok(object)
    }

    /// Reads the row's discriminator and resolves the concrete model.
    ///
    /// Returns the converted discriminator alongside, or `None` when the
    /// stored value could not be converted and the fallback policy applied.
    fn resolve_row_type(&self, row: &Row, queried: ModelId) -> Result<(ModelId, Option<Value>)> {
        let hierarchy = self.schema.hierarchy(queried);

        let Some(discriminator) = &hierarchy.discriminator else {
            return Ok((queried, None));
        };

        let stored = row.get(&discriminator.column);
        let value = self.schema.converters.from_storage(
            stored.clone(),
            &discriminator.storage_ty.to_stmt(),
            &discriminator.ty,
        );

        let resolved = value
            .as_ref()
            .map_err(|e| e.clone())
            .and_then(|value| self.schema.resolve_concrete_type(hierarchy.root, value));

        match resolved {
            Ok(ty) => Ok((ty, value.ok())),
            Err(e) => match self.config.unresolved_discriminator {
                UnresolvedDiscriminator::Error => Err(e),
                UnresolvedDiscriminator::Fallback => {
                    warn!(
                        table = %hierarchy.table,
                        value = %stored,
                        fallback = %self.schema.model(queried).name,
                        error = %e,
                        "unresolved discriminator; materializing as the queried type"
                    );
                    Ok((queried, value.ok()))
                }
            },
        }
    }
}
