//! Physical storage layout derived from the mapping.

use crate::convert::EnumRepr;
use crate::{stmt, Converters, Error, Result};

use indexmap::IndexMap;

/// The physical tables, one per inheritance hierarchy.
#[derive(Debug, Default)]
pub struct Schema {
    pub tables: IndexMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: Type,
    pub nullable: bool,
    pub primary_key: bool,
}

/// Storage type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Boolean,

    /// 32-bit integer
    Integer,

    /// 64-bit integer
    BigInt,

    /// Unbounded text
    Text,
}

impl Schema {
    /// # Panics
    ///
    /// Panics if no table has the given name.
    #[track_caller]
    pub fn table(&self, name: &str) -> &Table {
        self.tables.get(name).expect("invalid table name")
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> + '_ {
        self.tables.values()
    }
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

impl Type {
    /// Picks the native storage type for a property type.
    ///
    /// Enums are stored as text when their effective policy is
    /// [`EnumRepr::Name`], otherwise by ordinal.
    pub fn from_app(ty: &stmt::Type, converters: &Converters) -> Result<Self> {
        Ok(match ty {
            stmt::Type::Bool => Self::Boolean,
            stmt::Type::I32 => Self::Integer,
            stmt::Type::I64 => Self::BigInt,
            stmt::Type::String => Self::Text,
            stmt::Type::Enum(id) => match converters.policy(*id) {
                Some(EnumRepr::Name) => Self::Text,
                _ => Self::BigInt,
            },
            _ => {
                return Err(Error::invalid_mapping(format!(
                    "type {ty:?} cannot be stored in a column"
                )))
            }
        })
    }

    /// The scalar type of values stored with this tag.
    pub fn to_stmt(self) -> stmt::Type {
        match self {
            Self::Boolean => stmt::Type::Bool,
            Self::Integer => stmt::Type::I32,
            Self::BigInt => stmt::Type::I64,
            Self::Text => stmt::Type::String,
        }
    }
}
