use super::{db, ModelId, Schema};
use crate::stmt::{self, FieldPath, Value};
use crate::{Error, Result};

use indexmap::IndexMap;

/// An inheritance hierarchy persisted in one table.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub root: ModelId,

    pub table: String,

    /// The discriminator column, when the hierarchy uses one
    pub discriminator: Option<Discriminator>,

    /// Discriminator value to concrete model. Injective by construction.
    pub values: IndexMap<Value, ModelId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    /// Property holding the discriminator on the root model
    pub path: FieldPath,

    pub column: String,

    /// Property type of the discriminator
    pub ty: stmt::Type,

    pub storage_ty: db::Type,
}

impl Hierarchy {
    /// Looks up the model registered for a discriminator value.
    pub fn get(&self, value: &Value) -> Option<ModelId> {
        self.values.get(value).copied()
    }
}

impl Schema {
    /// Resolves the concrete model a discriminator value (already converted to
    /// the discriminator's property type) stands for within the hierarchy
    /// rooted at `root`.
    pub fn resolve_concrete_type(&self, root: ModelId, value: &Value) -> Result<ModelId> {
        let hierarchy = self.hierarchy(root);

        hierarchy
            .get(value)
            .ok_or_else(|| Error::unresolved_discriminator(&hierarchy.table, value))
    }

    /// Returns `ty` followed by all of its descendants, parents before
    /// children.
    pub fn subtype_set(&self, ty: ModelId) -> Vec<ModelId> {
        let mut set = vec![];
        let mut stack = vec![ty];

        while let Some(id) = stack.pop() {
            set.push(id);
            stack.extend(self.model(id).children.iter().rev());
        }

        set
    }

    /// Discriminator values of `ty` and all of its descendants. Abstract
    /// models without a value contribute nothing.
    pub fn subtype_values(&self, ty: ModelId) -> Vec<&Value> {
        self.subtype_set(ty)
            .into_iter()
            .filter_map(|id| self.model(id).discriminator_value.as_ref())
            .collect()
    }

    /// Returns true if `ty` is `of` or one of its descendants.
    pub fn is_subtype(&self, ty: ModelId, of: ModelId) -> bool {
        let mut current = Some(ty);

        while let Some(id) = current {
            if id == of {
                return true;
            }
            current = self.model(id).parent;
        }

        false
    }

    /// Returns true if `a` and `b` belong to the same hierarchy.
    pub fn is_related(&self, a: ModelId, b: ModelId) -> bool {
        self.model(a).root == self.model(b).root
    }
}
