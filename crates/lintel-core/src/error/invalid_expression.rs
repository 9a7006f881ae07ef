use super::Error;

/// Error when a predicate or load path cannot be translated against the
/// mapping.
///
/// This occurs when:
/// - A member path does not resolve to a mapped column
/// - A cast names a type outside the member's hierarchy
/// - A load path step is not an association
/// - A predicate navigates through a to-many association
#[derive(Debug)]
pub(super) struct InvalidExpression {
    message: Box<str>,
}

impl std::error::Error for InvalidExpression {}

impl core::fmt::Display for InvalidExpression {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid expression: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid expression error.
    pub fn invalid_expression(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidExpression(InvalidExpression {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error or any of its causes is an invalid expression error.
    pub fn is_invalid_expression(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidExpression(_)))
    }
}
