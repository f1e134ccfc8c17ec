use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Length error: {0}")]
    Length(String),

    #[error("Secret key is empty")]
    EmptySecret,

    #[error("Secret key is not valid {encoding}: {reason}")]
    SecretEncoding { encoding: &'static str, reason: String },

    #[error("Unsupported code length {0} (FF3 over radix 10 needs 6..=56 digits)")]
    UnsupportedLength(usize),
}

impl CodeError {
    /// True for malformed-input errors a caller can fix by sending a different value.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CodeError::UnsupportedLength(_))
    }
}
