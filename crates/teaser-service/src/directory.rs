//! Read-only recipient and advisory lookups
//!
//! The orchestrators only ever fetch by value. `MemoryDirectory` is loaded
//! once from a JSON seed document and never mutated afterwards, so it needs
//! no locking.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use teaser_core::SecretEncoding;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Directory backend error: {0}")]
    Backend(String),
}

/// A recipient's secret as stored: wire text plus the encoding tag chosen at
/// provisioning (absent for legacy records, which the oracle then sniffs).
#[derive(Clone)]
pub struct StoredSecret {
    pub text: Zeroizing<String>,
    pub encoding: Option<SecretEncoding>,
}

impl StoredSecret {
    pub fn new(text: impl Into<String>, encoding: Option<SecretEncoding>) -> Self {
        Self {
            text: Zeroizing::new(text.into()),
            encoding,
        }
    }
}

impl std::fmt::Debug for StoredSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredSecret")
            .field("text", &"[REDACTED]")
            .field("encoding", &self.encoding)
            .finish()
    }
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn lookup_secret_by_recipient(
        &self,
        address: &str,
    ) -> Result<StoredSecret, DirectoryError>;
    async fn lookup_advisory_title(&self, message_id: &str) -> Result<String, DirectoryError>;
    async fn lookup_advisory_body(&self, message_id: &str) -> Result<String, DirectoryError>;
}

#[derive(Clone, Deserialize)]
pub struct RecipientRecord {
    pub phone: String,
    pub secret_key: String,
    #[serde(default)]
    pub secret_encoding: Option<SecretEncoding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryRecord {
    pub id: u64,
    pub title: String,
    pub message: String,
}

#[derive(Clone, Default, Deserialize)]
pub struct DirectorySeed {
    #[serde(default)]
    pub farmers: Vec<RecipientRecord>,
    #[serde(default)]
    pub advisories: Vec<AdvisoryRecord>,
}

#[derive(Default)]
pub struct MemoryDirectory {
    recipients: HashMap<String, StoredSecret>,
    advisories: HashMap<u64, AdvisoryRecord>,
}

impl MemoryDirectory {
    pub fn from_seed(seed: DirectorySeed) -> Self {
        let mut dir = Self::default();
        for farmer in seed.farmers {
            let secret = StoredSecret::new(farmer.secret_key, farmer.secret_encoding);
            dir = dir.with_recipient(&farmer.phone, secret);
        }
        for advisory in seed.advisories {
            dir.advisories.insert(advisory.id, advisory);
        }
        dir
    }

    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DirectoryError::Backend(format!("read {}: {e}", path.display())))?;
        let seed: DirectorySeed = serde_json::from_str(&raw)
            .map_err(|e| DirectoryError::Backend(format!("parse {}: {e}", path.display())))?;
        Ok(Self::from_seed(seed))
    }

    pub fn with_recipient(mut self, phone: &str, secret: StoredSecret) -> Self {
        self.recipients.insert(phone.to_string(), secret);
        self
    }

    pub fn with_advisory(mut self, id: u64, title: &str, message: &str) -> Self {
        self.advisories.insert(
            id,
            AdvisoryRecord {
                id,
                title: title.to_string(),
                message: message.to_string(),
            },
        );
        self
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    pub fn advisory_count(&self) -> usize {
        self.advisories.len()
    }

    fn advisory(&self, message_id: &str) -> Result<&AdvisoryRecord, DirectoryError> {
        message_id
            .parse::<u64>()
            .ok()
            .and_then(|id| self.advisories.get(&id))
            .ok_or_else(|| DirectoryError::NotFound(format!("advisory {message_id}")))
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn lookup_secret_by_recipient(
        &self,
        address: &str,
    ) -> Result<StoredSecret, DirectoryError> {
        self.recipients
            .get(address)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(format!("recipient {address}")))
    }

    async fn lookup_advisory_title(&self, message_id: &str) -> Result<String, DirectoryError> {
        self.advisory(message_id).map(|a| a.title.clone())
    }

    async fn lookup_advisory_body(&self, message_id: &str) -> Result<String, DirectoryError> {
        self.advisory(message_id).map(|a| a.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"{
        "farmers": [
            {"phone": "+254700000001", "secret_key": "6b6579", "secret_encoding": "hex"},
            {"phone": "+254700000002", "secret_key": "legacy secret"}
        ],
        "advisories": [
            {"id": 42, "title": "Maize rust alert", "message": "Spray fungicide within 3 days."}
        ]
    }"#;

    #[tokio::test]
    async fn loads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();
        let dir = MemoryDirectory::load(file.path()).unwrap();
        assert_eq!(dir.recipient_count(), 2);
        assert_eq!(dir.advisory_count(), 1);

        let tagged = dir.lookup_secret_by_recipient("+254700000001").await.unwrap();
        assert_eq!(tagged.encoding, Some(SecretEncoding::Hex));
        let legacy = dir.lookup_secret_by_recipient("+254700000002").await.unwrap();
        assert_eq!(legacy.encoding, None);
        assert_eq!(legacy.text.as_str(), "legacy secret");
    }

    #[tokio::test]
    async fn advisory_ids_are_numeric() {
        let dir = MemoryDirectory::default().with_advisory(42, "t", "body");
        assert_eq!(dir.lookup_advisory_title("42").await.unwrap(), "t");
        assert_eq!(dir.lookup_advisory_body("042").await.unwrap(), "body");
        assert!(matches!(
            dir.lookup_advisory_body("43").await,
            Err(DirectoryError::NotFound(_))
        ));
        assert!(matches!(
            dir.lookup_advisory_title("abc").await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_recipient_not_found() {
        let dir = MemoryDirectory::default();
        assert!(matches!(
            dir.lookup_secret_by_recipient("+1").await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[test]
    fn bad_seed_is_backend_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ nope").unwrap();
        assert!(matches!(
            MemoryDirectory::load(file.path()),
            Err(DirectoryError::Backend(_))
        ));
    }

    #[test]
    fn stored_secret_debug_is_redacted() {
        let s = StoredSecret::new("hunter2", None);
        assert!(!format!("{s:?}").contains("hunter2"));
    }
}
