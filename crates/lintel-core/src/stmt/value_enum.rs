use super::{EnumId, Value};

/// A variant of a registered enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueEnum {
    pub ty: EnumId,

    /// Position of the variant within the enum declaration
    pub variant: usize,
}

impl ValueEnum {
    pub const fn new(ty: EnumId, variant: usize) -> Self {
        Self { ty, variant }
    }
}

impl From<ValueEnum> for Value {
    fn from(value: ValueEnum) -> Self {
        Self::Enum(value)
    }
}
