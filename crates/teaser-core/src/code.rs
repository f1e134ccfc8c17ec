//! Message identifier <-> verification code
//!
//! `encode` left-pads an identifier of at most `length` digits to exactly
//! `length` and enciphers it with FF3. `decode` deciphers an exact-width code
//! and strips the padding again, so `"0"` survives as `"0"`.
//!
//! A wrong but well-formed code still decodes to some identifier; callers
//! only notice when that identifier resolves to nothing.

use crate::error::CodeError;
use crate::ff3::{Ff3, MAX_LEN, MIN_LEN};
use crate::kdf::DerivedKey;

pub const DEFAULT_CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeTransform {
    length: usize,
}

impl Default for CodeTransform {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl CodeTransform {
    pub fn new(length: usize) -> Result<Self, CodeError> {
        if !(MIN_LEN..=MAX_LEN).contains(&length) {
            return Err(CodeError::UnsupportedLength(length));
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn encode(&self, message_id: &str, key: &DerivedKey) -> Result<String, CodeError> {
        let digits = parse_digits(message_id, "message id")?;
        if digits.len() > self.length {
            return Err(CodeError::Length(format!(
                "message id length ({}) exceeds maximum allowed length of {}",
                digits.len(),
                self.length
            )));
        }
        let mut padded = vec![0u8; self.length - digits.len()];
        padded.extend_from_slice(&digits);

        let code = Ff3::from_derived(key).encrypt(&padded)?;
        Ok(render(&code))
    }

    pub fn decode(&self, code: &str, key: &DerivedKey) -> Result<String, CodeError> {
        let digits = parse_digits(code, "verification code")?;
        if digits.len() != self.length {
            return Err(CodeError::Length(format!(
                "verification code must be exactly {} digits, got {}",
                self.length,
                digits.len()
            )));
        }

        let plain = Ff3::from_derived(key).decrypt(&digits)?;
        let significant = plain
            .iter()
            .position(|d| *d != 0)
            .map_or(&plain[plain.len() - 1..], |i| &plain[i..]);
        Ok(render(significant))
    }
}

fn parse_digits(text: &str, what: &str) -> Result<Vec<u8>, CodeError> {
    if text.is_empty() {
        return Err(CodeError::Validation(format!("{what} is empty")));
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodeError::Validation(format!("{what} must be numeric")));
    }
    Ok(text.bytes().map(|b| b - b'0').collect())
}

fn render(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}
