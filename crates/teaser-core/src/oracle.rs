//! Stateless encode/decode on behalf of a caller that presents the secret.
//!
//! The oracle never looks a secret up and never remembers one: every call
//! normalizes the presented text, derives FF3 material and runs the
//! transform. Safe to share across threads without locking.

use crate::code::CodeTransform;
use crate::error::CodeError;
use crate::secret::{MasterSecret, SecretEncoding};

#[derive(Debug, Clone, Copy, Default)]
pub struct Oracle {
    transform: CodeTransform,
}

impl Oracle {
    pub fn new(transform: CodeTransform) -> Self {
        Self { transform }
    }

    pub fn code_length(&self) -> usize {
        self.transform.length()
    }

    /// Message id -> verification code.
    pub fn encode(
        &self,
        secret_text: &str,
        encoding: Option<SecretEncoding>,
        message_id: &str,
    ) -> Result<String, CodeError> {
        let secret = MasterSecret::from_text(secret_text, encoding)?;
        self.transform.encode(message_id, &secret.derive())
    }

    /// Verification code -> message id.
    pub fn decode(
        &self,
        secret_text: &str,
        encoding: Option<SecretEncoding>,
        code: &str,
    ) -> Result<String, CodeError> {
        let secret = MasterSecret::from_text(secret_text, encoding)?;
        self.transform.decode(code, &secret.derive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_through_text_secret() {
        let oracle = Oracle::default();
        let code = oracle.encode("farmer-secret", None, "42").unwrap();
        assert_eq!(oracle.decode("farmer-secret", None, &code).unwrap(), "42");
    }

    #[test]
    fn encoding_tag_changes_the_key() {
        let oracle = Oracle::default();
        let sniffed = oracle.encode("cafe", None, "7").unwrap();
        let raw = oracle.encode("cafe", Some(SecretEncoding::Raw), "7").unwrap();
        assert_ne!(sniffed, raw);
        assert_eq!(oracle.encode("cafe", Some(SecretEncoding::Hex), "7").unwrap(), sniffed);
    }

    #[test]
    fn empty_secret_is_rejected_before_derivation() {
        let oracle = Oracle::default();
        assert_eq!(oracle.encode("", None, "42").unwrap_err(), CodeError::EmptySecret);
    }
}
