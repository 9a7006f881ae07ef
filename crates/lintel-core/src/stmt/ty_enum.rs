use super::{Value, ValueEnum};

use std::fmt;

/// Identifies an enumeration registered with [`Converters`](crate::Converters).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub usize);

/// An enum-like type: a name and its ordered variant names.
///
/// The position of a variant is its ordinal, which is the native storage
/// representation of the enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEnum {
    pub id: EnumId,
    pub name: String,
    pub variants: Vec<String>,
}

impl TypeEnum {
    /// Returns the value of the variant named `name`.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.variant_index(name, false)
            .map(|variant| ValueEnum::new(self.id, variant).into())
    }

    /// Parses a variant name, optionally ignoring ASCII case.
    pub fn parse(&self, name: &str, ignore_case: bool) -> Option<Value> {
        self.variant_index(name, ignore_case)
            .map(|variant| ValueEnum::new(self.id, variant).into())
    }

    /// Returns the name of the variant held by `value`.
    pub fn name_of(&self, value: &Value) -> Option<&str> {
        match value {
            Value::Enum(value) if value.ty == self.id => {
                self.variants.get(value.variant).map(String::as_str)
            }
            _ => None,
        }
    }

    pub fn from_ordinal(&self, ordinal: i64) -> Option<Value> {
        let variant = usize::try_from(ordinal).ok()?;
        (variant < self.variants.len()).then(|| ValueEnum::new(self.id, variant).into())
    }

    fn variant_index(&self, name: &str, ignore_case: bool) -> Option<usize> {
        self.variants.iter().position(|variant| {
            if ignore_case {
                variant.eq_ignore_ascii_case(name)
            } else {
                variant == name
            }
        })
    }
}

impl fmt::Debug for EnumId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "EnumId({})", self.0)
    }
}
