use super::Error;
use crate::stmt::Value;

/// Error when a stored discriminator value has no registered type.
#[derive(Debug)]
pub(super) struct UnresolvedDiscriminator {
    table: Box<str>,
    value: Value,
}

impl std::error::Error for UnresolvedDiscriminator {}

impl core::fmt::Display for UnresolvedDiscriminator {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "unresolved discriminator {} in table {}",
            self.value, self.table
        )
    }
}

impl Error {
    /// Creates an unresolved discriminator error.
    pub fn unresolved_discriminator(table: &str, value: &Value) -> Error {
        Error::from(super::ErrorKind::UnresolvedDiscriminator(
            UnresolvedDiscriminator {
                table: table.into(),
                value: value.clone(),
            },
        ))
    }

    /// Returns `true` if this error or any of its causes is an unresolved discriminator error.
    pub fn is_unresolved_discriminator(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::UnresolvedDiscriminator(_)))
    }
}
