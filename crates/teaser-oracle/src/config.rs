use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use teaser_core::DEFAULT_CODE_LENGTH;

pub const DEFAULT_BIND: &str = "0.0.0.0:5001";

#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub bind: SocketAddr,
    pub code_length: usize,
    /// When set, requests must carry `Authorization: Bearer <token>`.
    pub api_token: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.parse().expect("static bind address"),
            code_length: DEFAULT_CODE_LENGTH,
            api_token: None,
        }
    }
}

impl OracleConfig {
    /// `ORACLE_BIND`, `ORACLE_CODE_LENGTH`, `ORACLE_API_TOKEN`; all optional.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(bind) = std::env::var("ORACLE_BIND") {
            config.bind = bind
                .parse()
                .map_err(|e| anyhow!("ORACLE_BIND invalid ({bind}): {e}"))?;
        }
        if let Ok(len) = std::env::var("ORACLE_CODE_LENGTH") {
            config.code_length = len
                .parse()
                .map_err(|e| anyhow!("ORACLE_CODE_LENGTH invalid ({len}): {e}"))?;
        }
        config.api_token = std::env::var("ORACLE_API_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        Ok(config)
    }
}
