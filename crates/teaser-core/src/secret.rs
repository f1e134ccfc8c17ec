//! Recipient master secrets and their textual forms
//!
//! A secret crosses the wire as text. Recipients provisioned with an explicit
//! [`SecretEncoding`] are decoded exactly; untagged secrets fall back to
//! [`SecretEncoding::detect`], which tries hex, then base64, then raw UTF-8.
//! The fallback is ambiguous for short inputs: `"cafe"` is read as two hex
//! bytes even if it was meant as four characters of text.
//!
//! Rotating a recipient's secret invalidates every verification code issued
//! under the previous value. Nothing here remembers old secrets.

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::CodeError;
use crate::kdf::{derive, DerivedKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretEncoding {
    Hex,
    Base64,
    Raw,
}

impl SecretEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretEncoding::Hex => "hex",
            SecretEncoding::Base64 => "base64",
            SecretEncoding::Raw => "raw",
        }
    }

    /// Guess the encoding of an untagged secret: hex, then base64, then raw.
    pub fn detect(text: &str) -> SecretEncoding {
        if looks_like_hex(text) {
            return SecretEncoding::Hex;
        }
        if looks_like_base64(text) && general_purpose::STANDARD.decode(text).is_ok() {
            return SecretEncoding::Base64;
        }
        SecretEncoding::Raw
    }

    pub fn decode(self, text: &str) -> Result<Vec<u8>, CodeError> {
        match self {
            SecretEncoding::Hex => hex::decode(text).map_err(|e| CodeError::SecretEncoding {
                encoding: self.as_str(),
                reason: e.to_string(),
            }),
            SecretEncoding::Base64 => {
                general_purpose::STANDARD
                    .decode(text)
                    .map_err(|e| CodeError::SecretEncoding {
                        encoding: self.as_str(),
                        reason: e.to_string(),
                    })
            }
            SecretEncoding::Raw => Ok(text.as_bytes().to_vec()),
        }
    }

    pub fn encode(self, bytes: &[u8]) -> Result<String, CodeError> {
        match self {
            SecretEncoding::Hex => Ok(hex::encode(bytes)),
            SecretEncoding::Base64 => Ok(general_purpose::STANDARD.encode(bytes)),
            SecretEncoding::Raw => String::from_utf8(bytes.to_vec()).map_err(|_| {
                CodeError::SecretEncoding {
                    encoding: self.as_str(),
                    reason: "secret bytes are not UTF-8".into(),
                }
            }),
        }
    }
}

fn looks_like_hex(text: &str) -> bool {
    text.len() % 2 == 0 && text.chars().all(|c| c.is_ascii_hexdigit())
}

fn looks_like_base64(text: &str) -> bool {
    let body: String = text
        .chars()
        .filter(|c| !matches!(c, '=' | '+' | '/'))
        .collect();
    text.len() % 4 == 0 && !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Per-recipient master secret. Zeroized on drop, redacted in `Debug`.
#[derive(Clone)]
pub struct MasterSecret(Zeroizing<Vec<u8>>);

impl MasterSecret {
    pub fn new(bytes: Vec<u8>) -> Result<Self, CodeError> {
        if bytes.is_empty() {
            return Err(CodeError::EmptySecret);
        }
        Ok(Self(Zeroizing::new(bytes)))
    }

    /// Decode wire text with the given encoding, or guess it when untagged.
    pub fn from_text(text: &str, encoding: Option<SecretEncoding>) -> Result<Self, CodeError> {
        if text.is_empty() {
            return Err(CodeError::EmptySecret);
        }
        let encoding = encoding.unwrap_or_else(|| SecretEncoding::detect(text));
        Self::new(encoding.decode(text)?)
    }

    pub fn to_text(&self, encoding: SecretEncoding) -> Result<String, CodeError> {
        encoding.encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn derive(&self) -> DerivedKey {
        derive(&self.0)
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterSecret([REDACTED; {}])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_order() {
        assert_eq!(SecretEncoding::detect("deadbeef"), SecretEncoding::Hex);
        assert_eq!(SecretEncoding::detect("c2VjcmV0"), SecretEncoding::Base64);
        assert_eq!(SecretEncoding::detect("c2VjcmV0MQ=="), SecretEncoding::Base64);
        assert_eq!(SecretEncoding::detect("farmer secret"), SecretEncoding::Raw);
        // odd length, not hex; length 5 rules out base64
        assert_eq!(SecretEncoding::detect("abcde"), SecretEncoding::Raw);
    }

    #[test]
    fn hex_looking_text_is_read_as_hex() {
        let secret = MasterSecret::from_text("cafe", None).unwrap();
        assert_eq!(secret.as_bytes(), &[0xca, 0xfe]);
        let raw = MasterSecret::from_text("cafe", Some(SecretEncoding::Raw)).unwrap();
        assert_eq!(raw.as_bytes(), b"cafe");
    }

    #[test]
    fn base64_with_bad_padding_falls_back_to_raw() {
        assert_eq!(SecretEncoding::detect("ab=c"), SecretEncoding::Raw);
    }

    #[test]
    fn explicit_encoding_rejects_malformed_text() {
        let err = MasterSecret::from_text("xyz1", Some(SecretEncoding::Hex)).unwrap_err();
        assert!(matches!(err, CodeError::SecretEncoding { encoding: "hex", .. }));
    }

    #[test]
    fn empty_secret_rejected() {
        assert_eq!(MasterSecret::from_text("", None).unwrap_err(), CodeError::EmptySecret);
        assert_eq!(MasterSecret::new(vec![]).unwrap_err(), CodeError::EmptySecret);
    }

    #[test]
    fn text_round_trip_per_encoding() {
        let secret = MasterSecret::new(b"s3cr3t-key".to_vec()).unwrap();
        for enc in [SecretEncoding::Hex, SecretEncoding::Base64, SecretEncoding::Raw] {
            let text = secret.to_text(enc).unwrap();
            let back = MasterSecret::from_text(&text, Some(enc)).unwrap();
            assert_eq!(back.as_bytes(), secret.as_bytes());
        }
    }

    #[test]
    fn debug_is_redacted() {
        let secret = MasterSecret::new(b"hunter2".to_vec()).unwrap();
        assert_eq!(format!("{secret:?}"), "MasterSecret([REDACTED; 7])");
    }
}
