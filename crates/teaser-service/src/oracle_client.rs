use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use teaser_core::protocol::{
    ErrorBody, GetMessageIdResponse, GetVcResponse, GET_MESSAGE_ID_PATH, GET_VC_PATH,
};
use teaser_core::{Oracle, SecretEncoding};
use thiserror::Error;

use crate::directory::StoredSecret;

#[derive(Debug, Error)]
pub enum OracleError {
    /// The oracle answered 400: the code, id or secret was malformed.
    #[error("oracle rejected request: {0}")]
    Rejected(String),

    #[error("oracle returned status {0}")]
    Status(u16),

    #[error("oracle unreachable: {0}")]
    Transport(String),

    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CodeOracle: Send + Sync {
    async fn encode(&self, secret: &StoredSecret, message_id: &str) -> Result<String, OracleError>;
    async fn decode(&self, secret: &StoredSecret, code: &str) -> Result<String, OracleError>;
}

/// Outgoing `/get-vc` body. Borrows the secret so no unzeroized copy is made.
#[derive(Serialize)]
struct VcQuery<'a> {
    message_id: &'a str,
    secret_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_encoding: Option<SecretEncoding>,
}

/// Outgoing `/get-messageID` body.
#[derive(Serialize)]
struct MessageIdQuery<'a> {
    vc: &'a str,
    secret_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_encoding: Option<SecretEncoding>,
}

/// HTTP client for a remote oracle.
#[derive(Clone)]
pub struct OracleClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl OracleClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .user_agent("teaser-service/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Transport(format!("client init: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn call<B, R>(&self, path: &str, body: &B) -> Result<R, OracleError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(url).json(body);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let res = req
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = res.status();
        if status.is_success() {
            return res
                .json::<R>()
                .await
                .map_err(|e| OracleError::Malformed(e.to_string()));
        }
        if status.as_u16() == 400 {
            let message = res
                .json::<ErrorBody>()
                .await
                .map(|b| b.message)
                .unwrap_or_else(|_| "bad request".to_string());
            return Err(OracleError::Rejected(message));
        }
        Err(OracleError::Status(status.as_u16()))
    }
}

#[async_trait]
impl CodeOracle for OracleClient {
    async fn encode(&self, secret: &StoredSecret, message_id: &str) -> Result<String, OracleError> {
        let body = VcQuery {
            message_id,
            secret_key: secret.text.as_str(),
            secret_encoding: secret.encoding,
        };
        let res: GetVcResponse = self.call(GET_VC_PATH, &body).await?;
        if res.vc.is_empty() {
            return Err(OracleError::Malformed("no verification code in response".into()));
        }
        Ok(res.vc)
    }

    async fn decode(&self, secret: &StoredSecret, code: &str) -> Result<String, OracleError> {
        let body = MessageIdQuery {
            vc: code,
            secret_key: secret.text.as_str(),
            secret_encoding: secret.encoding,
        };
        let res: GetMessageIdResponse = self.call(GET_MESSAGE_ID_PATH, &body).await?;
        if res.message_id.is_empty() {
            return Err(OracleError::Malformed("no message id in response".into()));
        }
        Ok(res.message_id)
    }
}

/// In-process oracle, for single-host deployments and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalOracle(pub Oracle);

#[async_trait]
impl CodeOracle for LocalOracle {
    async fn encode(&self, secret: &StoredSecret, message_id: &str) -> Result<String, OracleError> {
        self.0
            .encode(&secret.text, secret.encoding, message_id)
            .map_err(|e| OracleError::Rejected(e.to_string()))
    }

    async fn decode(&self, secret: &StoredSecret, code: &str) -> Result<String, OracleError> {
        self.0
            .decode(&secret.text, secret.encoding, code)
            .map_err(|e| OracleError::Rejected(e.to_string()))
    }
}
