use super::Error;

/// Error when the mapping configuration is inconsistent.
///
/// This occurs when:
/// - Two types in one hierarchy share a discriminator value
/// - An association's owner and target key lists differ in length
/// - A property is declared both as a column and as a navigation property
/// - A non-root type declares its own discriminator column
///
/// These errors are raised by `Builder::build` and abort configuration.
#[derive(Debug)]
pub(super) struct InvalidMapping {
    message: Box<str>,
}

impl std::error::Error for InvalidMapping {}

impl core::fmt::Display for InvalidMapping {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid mapping: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid mapping error.
    pub fn invalid_mapping(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidMapping(InvalidMapping {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error or any of its causes is an invalid mapping error.
    pub fn is_invalid_mapping(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidMapping(_)))
    }
}
