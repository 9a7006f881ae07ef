use super::{Association, Column};
use crate::stmt::{FieldPath, Value};

use std::fmt;

/// A mapped type descriptor.
///
/// Columns and associations are merged with those inherited from ancestors,
/// so a descriptor is self-contained: readers never walk the parent chain to
/// find a mapping.
#[derive(Debug, Clone)]
pub struct Model {
    /// Uniquely identifies the model within the schema
    pub id: ModelId,

    /// Name of the model
    pub name: String,

    /// Physical table, shared by every model in the hierarchy
    pub table: String,

    /// Direct supertype under single-table inheritance
    pub parent: Option<ModelId>,

    /// Direct subtypes
    pub children: Vec<ModelId>,

    /// Root of the model's hierarchy (the model itself when it has no parent)
    pub root: ModelId,

    /// Value stored in the hierarchy's discriminator column for rows of
    /// exactly this type
    pub discriminator_value: Option<Value>,

    /// Column mappings, inherited ones first. Includes mappings excluded by
    /// this model; see [`Model::columns`].
    pub columns: Vec<Column>,

    /// Navigation properties, inherited ones first
    pub associations: Vec<Association>,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub usize);

impl Model {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the stored (non-excluded) column mappings.
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.iter().filter(|column| !column.excluded)
    }

    /// Returns the stored column mapped at `path`.
    pub fn column(&self, path: &FieldPath) -> Option<&Column> {
        self.columns().find(|column| &column.path == path)
    }

    /// Returns the stored column whose property path is exactly `names`.
    pub fn column_by_names<S: AsRef<str>>(&self, names: &[S]) -> Option<&Column> {
        self.columns().find(|column| column.path.matches(names))
    }

    pub fn discriminator_column(&self) -> Option<&Column> {
        self.columns().find(|column| column.discriminator)
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns().filter(|column| column.primary_key)
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations
            .iter()
            .find(|association| association.name == name)
    }
}

impl From<&Self> for ModelId {
    fn from(src: &Self) -> Self {
        *src
    }
}

impl From<&Model> for ModelId {
    fn from(value: &Model) -> Self {
        value.id
    }
}

impl fmt::Debug for ModelId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "ModelId({})", self.0)
    }
}
