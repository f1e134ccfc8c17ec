//! JSON bodies for the oracle's HTTP contract.
//!
//! `POST /get-vc`         GetVcRequest        -> GetVcResponse
//! `POST /get-messageID`  GetMessageIdRequest -> GetMessageIdResponse
//! Any rejection          -> ErrorBody (HTTP 400 / 401)

use serde::{Deserialize, Serialize};

use crate::secret::SecretEncoding;

pub const GET_VC_PATH: &str = "/get-vc";
pub const GET_MESSAGE_ID_PATH: &str = "/get-messageID";
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetVcRequest {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_encoding: Option<SecretEncoding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetVcResponse {
    pub vc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMessageIdRequest {
    #[serde(default)]
    pub vc: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_encoding: Option<SecretEncoding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetMessageIdResponse {
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl ErrorBody {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            error: "Invalid request".into(),
            message: message.into(),
            required: vec![],
        }
    }

    pub fn missing(required: &[&str]) -> Self {
        Self {
            error: "Missing required fields".into(),
            message: format!("required: {}", required.join(", ")),
            required: required.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_request_omits_encoding() {
        let req = GetVcRequest {
            message_id: Some("42".into()),
            secret_key: Some("abcd".into()),
            secret_encoding: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"message_id": "42", "secret_key": "abcd"}));
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let req: GetMessageIdRequest = serde_json::from_str(r#"{"vc": "123456"}"#).unwrap();
        assert!(req.secret_key.is_none());
        assert!(req.secret_encoding.is_none());
    }

    #[test]
    fn encoding_tag_is_lowercase() {
        let req: GetVcRequest = serde_json::from_str(
            r#"{"message_id": "1", "secret_key": "k", "secret_encoding": "base64"}"#,
        )
        .unwrap();
        assert_eq!(req.secret_encoding, Some(SecretEncoding::Base64));
    }
}
