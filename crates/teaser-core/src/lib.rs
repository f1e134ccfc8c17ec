//! teaser-core: verification code primitives
//!
//! A verification code (VC) is a fixed-width numeric surrogate for an advisory
//! message identifier, keyed per recipient. Only a holder of the recipient's
//! master secret can map between the two.
//!
//! # Module layout
//! - `kdf`: HMAC-SHA256 split of a master secret into FF3 key + tweak
//! - `ff3`: radix-10 FF3 format-preserving Feistel cipher over AES-128
//! - `code`: padded encode / unpadded decode of message identifiers
//! - `secret`: master secret newtype and its textual encodings
//! - `oracle`: stateless encode/decode keyed by a presented secret
//! - `protocol`: JSON bodies exchanged with the oracle
//! - `error`: unified error type

pub mod code;
pub mod error;
pub mod ff3;
pub mod kdf;
pub mod oracle;
pub mod protocol;
pub mod secret;

pub use code::{CodeTransform, DEFAULT_CODE_LENGTH};
pub use error::CodeError;
pub use kdf::{derive, DerivedKey};
pub use oracle::Oracle;
pub use secret::{MasterSecret, SecretEncoding};
