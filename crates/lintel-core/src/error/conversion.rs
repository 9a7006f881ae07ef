use super::Error;
use crate::stmt::{Type, Value};

/// Error when no converter or default policy covers a conversion.
#[derive(Debug)]
pub(super) struct ConversionError {
    value_ty: Type,
    target: Type,
}

impl std::error::Error for ConversionError {}

impl core::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "cannot convert {:?} to {:?}", self.value_ty, self.target)
    }
}

impl Error {
    /// Creates a conversion error for `value`, declared as `source`, that
    /// could not be converted to `target`.
    pub fn conversion(value: &Value, source: &Type, target: &Type) -> Error {
        let value_ty = value.infer_ty().unwrap_or_else(|| source.clone());

        Error::from(super::ErrorKind::Conversion(ConversionError {
            value_ty,
            target: target.clone(),
        }))
    }

    /// Returns `true` if this error or any of its causes is a conversion error.
    pub fn is_conversion(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Conversion(_)))
    }
}
