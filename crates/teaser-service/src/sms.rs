//! Outbound SMS
//!
//! `HttpSmsGateway` posts a form to a bulk-SMS HTTP API (`apiKey` header,
//! `username` / `to` / `message` fields); 200 and 201 count as accepted.
//! `LogGateway` only logs and keeps the most recent messages in a bounded
//! outbox, for development.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("SMS gateway unreachable: {0}")]
    Transport(String),

    #[error("SMS gateway returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone)]
pub struct SmsReceipt {
    pub gateway: &'static str,
    pub detail: Value,
}

#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, to: &str, text: &str) -> Result<SmsReceipt, GatewayError>;
}

#[derive(Clone)]
pub struct HttpSmsGateway {
    client: reqwest::Client,
    url: String,
    username: String,
    api_key: String,
}

impl HttpSmsGateway {
    pub fn new(
        url: &str,
        username: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent("teaser-service/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("client init: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
            username: username.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send(&self, to: &str, text: &str) -> Result<SmsReceipt, GatewayError> {
        let form = [
            ("username", self.username.as_str()),
            ("to", to),
            ("message", text),
            ("bulkSMSMode", "1"),
            ("enqueue", "1"),
        ];
        let res = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .header("apiKey", &self.api_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = res.status().as_u16();
        let body = res
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if status != 200 && status != 201 {
            return Err(GatewayError::Rejected { status, body });
        }
        let detail = serde_json::from_str(&body).unwrap_or(Value::String(body));
        debug!(%status, "sms accepted by gateway");
        Ok(SmsReceipt {
            gateway: "http",
            detail,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentSms {
    pub to: String,
    pub text: String,
}

/// Messages kept by a `LogGateway` before the oldest is evicted.
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

pub struct LogGateway {
    outbox: Mutex<VecDeque<SentSms>>,
    capacity: usize,
}

impl Default for LogGateway {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_OUTBOX_CAPACITY)
    }
}

impl LogGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            outbox: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Most recent messages, oldest first.
    pub fn sent(&self) -> Vec<SentSms> {
        self.outbox.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl SmsGateway for LogGateway {
    async fn send(&self, to: &str, text: &str) -> Result<SmsReceipt, GatewayError> {
        info!(%to, chars = text.chars().count(), "sms (log gateway)");
        if self.capacity > 0 {
            let mut outbox = self.outbox.lock();
            if outbox.len() == self.capacity {
                outbox.pop_front();
            }
            outbox.push_back(SentSms {
                to: to.to_string(),
                text: text.to_string(),
            });
        }
        Ok(SmsReceipt {
            gateway: "log",
            detail: Value::Null,
        })
    }
}
