use super::EnumId;
use crate::schema::ModelId;

/// The type of a property, a stored scalar, or a conversion endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Boolean value
    Bool,

    /// Signed 32-bit integer
    I32,

    /// Signed 64-bit integer
    I64,

    /// String type
    String,

    /// A registered enumeration
    Enum(EnumId),

    /// An instance of a mapped model
    Model(ModelId),

    /// A nested value object whose leaves are flattened into columns
    Embedded,

    /// A list of a single type
    List(Box<Type>),

    /// The representation of a value once it is embedded in a filter.
    ///
    /// Converters registered with `Param` as their target are only used when
    /// translating predicates, never when reading or writing rows.
    Param,
}

impl Type {
    pub fn list(ty: impl Into<Self>) -> Self {
        Self::List(Box::new(ty.into()))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::I32 | Self::I64)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Returns true if values of this type can be stored in a single column.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Bool | Self::I32 | Self::I64 | Self::String | Self::Enum(_)
        )
    }

    pub fn as_enum(&self) -> Option<EnumId> {
        match self {
            Self::Enum(id) => Some(*id),
            _ => None,
        }
    }
}
