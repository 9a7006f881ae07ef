//! The mapping schema registry.
//!
//! A [`Schema`] is produced once by [`Builder::build`] and is read-only
//! afterwards. It holds the merged [`Model`] descriptors (one per mapped type,
//! with inherited columns and associations resolved), the discriminator map of
//! every inheritance hierarchy, the derived physical tables, and the
//! [`Converters`] used to move values across the storage boundary.

mod association;
pub use association::{Association, Cardinality};

mod builder;
pub use builder::{AssociationBuilder, Builder, ColumnBuilder, ModelBuilder};

mod column;
pub use column::Column;

pub mod db;

mod hierarchy;
pub use hierarchy::{Discriminator, Hierarchy};

mod model;
pub use model::{Model, ModelId};

use crate::{Converters, Error, Result};

use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct Schema {
    /// Merged type descriptors, indexed by model identifier
    pub models: IndexMap<ModelId, Model>,

    /// Discriminator maps, indexed by hierarchy root
    pub hierarchies: IndexMap<ModelId, Hierarchy>,

    /// Physical tables, one per hierarchy
    pub db: Arc<db::Schema>,

    pub converters: Converters,
}

impl Schema {
    pub fn builder(converters: Converters) -> Builder {
        Builder::new(converters)
    }

    /// Get a model by ID
    ///
    /// # Panics
    ///
    /// Panics if the model ID does not exist in the schema.
    #[track_caller]
    pub fn model(&self, id: impl Into<ModelId>) -> &Model {
        self.models.get(&id.into()).expect("invalid model ID")
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> + '_ {
        self.models.values()
    }

    pub fn model_by_name(&self, name: &str) -> Option<&Model> {
        self.models.values().find(|model| model.name == name)
    }

    /// Looks up a model identifier by name.
    pub fn model_id(&self, name: &str) -> Result<ModelId> {
        self.model_by_name(name)
            .map(|model| model.id)
            .ok_or_else(|| Error::invalid_expression(format!("unknown model `{name}`")))
    }

    /// Returns the hierarchy `id` belongs to.
    #[track_caller]
    pub fn hierarchy(&self, id: impl Into<ModelId>) -> &Hierarchy {
        let root = self.model(id).root;
        self.hierarchies.get(&root).expect("model without hierarchy")
    }

    /// Returns the physical table backing `id`.
    #[track_caller]
    pub fn table_for(&self, id: impl Into<ModelId>) -> &db::Table {
        self.db.table(&self.model(id).table)
    }
}
