use super::{db, ModelId};
use crate::stmt::{self, FieldPath};

/// Maps one scalar property (possibly nested) to a physical column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Property path on the model, e.g. `DogName.First`
    pub path: FieldPath,

    /// Physical column name
    pub name: String,

    /// Property type
    pub ty: stmt::Type,

    /// How the value is stored
    pub storage_ty: db::Type,

    pub nullable: bool,

    pub primary_key: bool,

    /// True for the hierarchy's discriminator column
    pub discriminator: bool,

    /// True when a subtype excluded the inherited mapping from storage
    pub excluded: bool,

    /// Model whose declaration produced this mapping
    pub declared_by: ModelId,
}

impl Column {
    /// The scalar type the driver stores for this column.
    pub fn stored_ty(&self) -> stmt::Type {
        self.storage_ty.to_stmt()
    }
}
