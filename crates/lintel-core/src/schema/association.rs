use super::ModelId;
use crate::stmt::FieldPath;

/// A navigation property backed by key equality between owner and target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Navigation property name on the owner
    pub name: String,

    /// Target model. May be a hierarchy root, in which case related objects
    /// materialize as whatever subtype their discriminator names.
    pub target: ModelId,

    /// Owner key properties, pairwise matched with `target_keys`
    pub owner_keys: Vec<FieldPath>,

    /// Target key properties
    pub target_keys: Vec<FieldPath>,

    pub cardinality: Cardinality,

    /// Model whose declaration produced this association
    pub declared_by: ModelId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Cardinality {
    /// The navigation holds at most one related object
    #[default]
    One,

    /// The navigation holds a list of related objects
    Many,
}

impl Association {
    /// Iterate the `(owner key, target key)` pairs.
    pub fn key_pairs(&self) -> impl Iterator<Item = (&FieldPath, &FieldPath)> + '_ {
        self.owner_keys.iter().zip(self.target_keys.iter())
    }

    pub fn is_many(&self) -> bool {
        matches!(self.cardinality, Cardinality::Many)
    }
}
