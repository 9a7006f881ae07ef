use super::ModelDecl;
use crate::schema::{db, Cardinality};
use crate::stmt::{FieldPath, Type, Value};

/// Accumulates the mapping of one model. Returned by
/// [`Builder::model`](super::Builder::model).
pub struct ModelBuilder<'a> {
    pub(super) decl: &'a mut ModelDecl,
}

/// Configuration of one column mapping.
#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    pub(super) path: FieldPath,
    pub(super) ty: Type,
    pub(super) name: Option<String>,
    pub(super) nullable: bool,
    pub(super) primary_key: bool,
    pub(super) discriminator: bool,
    pub(super) storage_ty: Option<db::Type>,
}

/// Configuration of one association.
#[derive(Debug, Clone)]
pub struct AssociationBuilder {
    pub(super) name: String,
    pub(super) target: String,
    pub(super) owner_keys: Vec<FieldPath>,
    pub(super) target_keys: Vec<FieldPath>,
    pub(super) cardinality: Cardinality,
}

impl ModelBuilder<'_> {
    /// Maps the model to `name`. Subtypes inherit their root's table and may
    /// only repeat it.
    pub fn table_name(self, name: impl Into<String>) -> Self {
        self.decl.table = Some(name.into());
        self
    }

    /// Declares `parent` as the direct supertype.
    pub fn extends(self, parent: impl Into<String>) -> Self {
        self.decl.parent = Some(parent.into());
        self
    }

    /// Sets the discriminator value identifying rows of exactly this model.
    pub fn discriminator_value(self, value: impl Into<Value>) -> Self {
        self.decl.discriminator_value = Some(value.into());
        self
    }

    /// Declares, from an ancestor, the discriminator value of `subtype`.
    ///
    /// A subtype without an explicit `extends` becomes a direct child of the
    /// declaring model.
    pub fn inheritance(self, subtype: impl Into<String>, value: impl Into<Value>) -> Self {
        self.decl.subtypes.push((subtype.into(), value.into()));
        self
    }

    /// Maps the property at `path` to a column with default settings: the
    /// column is named after the path, not nullable, and stored natively.
    pub fn column(self, path: impl Into<FieldPath>, ty: Type) -> Self {
        self.column_with(path, ty, |column| column)
    }

    /// Maps the property at `path` to a column configured by `f`.
    pub fn column_with(
        self,
        path: impl Into<FieldPath>,
        ty: Type,
        f: impl FnOnce(ColumnBuilder) -> ColumnBuilder,
    ) -> Self {
        let column = f(ColumnBuilder {
            path: path.into(),
            ty,
            name: None,
            nullable: false,
            primary_key: false,
            discriminator: false,
            storage_ty: None,
        });

        match self
            .decl
            .columns
            .iter_mut()
            .find(|existing| existing.path == column.path)
        {
            Some(existing) => *existing = column,
            None => self.decl.columns.push(column),
        }

        self
    }

    /// Marks the property at `path` as not stored. Excluding an inherited
    /// column removes it from this model and its descendants.
    pub fn exclude(self, path: impl Into<FieldPath>) -> Self {
        self.decl.excluded.push(path.into());
        self
    }

    /// Declares the navigation property `name` targeting `target`.
    pub fn association(
        self,
        name: impl Into<String>,
        target: impl Into<String>,
        f: impl FnOnce(AssociationBuilder) -> AssociationBuilder,
    ) -> Self {
        let association = f(AssociationBuilder {
            name: name.into(),
            target: target.into(),
            owner_keys: vec![],
            target_keys: vec![],
            cardinality: Cardinality::One,
        });

        match self
            .decl
            .associations
            .iter_mut()
            .find(|existing| existing.name == association.name)
        {
            Some(existing) => *existing = association,
            None => self.decl.associations.push(association),
        }

        self
    }
}

impl ColumnBuilder {
    /// Sets the physical column name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the column as the hierarchy's discriminator. Only valid on a
    /// hierarchy root.
    pub fn discriminator(mut self) -> Self {
        self.discriminator = true;
        self
    }

    /// Sets an explicit storage type, e.g. text for an enum.
    pub fn storage(mut self, ty: db::Type) -> Self {
        self.storage_ty = Some(ty);
        self
    }
}

impl AssociationBuilder {
    /// Adds an `(owner key, target key)` pair.
    pub fn key(mut self, owner: impl Into<FieldPath>, target: impl Into<FieldPath>) -> Self {
        self.owner_keys.push(owner.into());
        self.target_keys.push(target.into());
        self
    }

    /// Sets the owner and target key lists at once.
    pub fn keys<O, T>(
        mut self,
        owner: impl IntoIterator<Item = O>,
        target: impl IntoIterator<Item = T>,
    ) -> Self
    where
        O: Into<FieldPath>,
        T: Into<FieldPath>,
    {
        self.owner_keys = owner.into_iter().map(Into::into).collect();
        self.target_keys = target.into_iter().map(Into::into).collect();
        self
    }

    /// The navigation holds every matching target instead of at most one.
    pub fn many(mut self) -> Self {
        self.cardinality = Cardinality::Many;
        self
    }
}
