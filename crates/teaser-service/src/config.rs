use anyhow::{anyhow, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use teaser_core::DEFAULT_CODE_LENGTH;

use crate::delivery::DEFAULT_TEASER_TEMPLATE;
use crate::ussd::DEFAULT_USSD_ACK;

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_ORACLE_URL: &str = "http://localhost:5001";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OracleTarget {
    Remote { base_url: String, token: Option<String> },
    /// Run the transform in-process instead of calling out.
    Local,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SmsConfig {
    Log,
    Http {
        url: String,
        username: String,
        api_key: String,
    },
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub bind: SocketAddr,
    pub code_length: usize,
    pub ussd_prefix: String,
    pub teaser_template: String,
    pub ussd_ack: String,
    pub oracle: OracleTarget,
    pub http_timeout: Duration,
    pub sms: SmsConfig,
    pub directory_seed: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Keys:
    /// `TEASER_BIND`, `TEASER_CODE_LENGTH`, `TEASER_USSD_PREFIX` (falls back to
    /// `USSD_CODE`), `TEASER_TEMPLATE`, `TEASER_USSD_ACK`, `TEASER_ORACLE_URL`
    /// (`local` for in-process), `TEASER_ORACLE_TOKEN` (falls back to
    /// `SMC_API_KEY`), `TEASER_HTTP_TIMEOUT_SECS`, `TEASER_SMS_URL`,
    /// `TEASER_SMS_USERNAME`, `TEASER_SMS_API_KEY`, `TEASER_DIRECTORY_SEED`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = get("TEASER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .map_err(|e| anyhow!("TEASER_BIND invalid ({bind}): {e}"))?;

        let code_length = match get("TEASER_CODE_LENGTH") {
            Some(v) => v
                .parse()
                .map_err(|e| anyhow!("TEASER_CODE_LENGTH invalid ({v}): {e}"))?,
            None => DEFAULT_CODE_LENGTH,
        };

        let ussd_prefix = get("TEASER_USSD_PREFIX")
            .or_else(|| get("USSD_CODE"))
            .ok_or_else(|| anyhow!("TEASER_USSD_PREFIX missing"))?;

        let oracle = match get("TEASER_ORACLE_URL") {
            Some(url) if url.eq_ignore_ascii_case("local") => OracleTarget::Local,
            url => OracleTarget::Remote {
                base_url: url.unwrap_or_else(|| DEFAULT_ORACLE_URL.to_string()),
                token: get("TEASER_ORACLE_TOKEN").or_else(|| get("SMC_API_KEY")),
            },
        };

        let http_timeout = match get("TEASER_HTTP_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse()
                    .map_err(|e| anyhow!("TEASER_HTTP_TIMEOUT_SECS invalid ({v}): {e}"))?,
            ),
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let sms = match get("TEASER_SMS_URL") {
            None => SmsConfig::Log,
            Some(url) => SmsConfig::Http {
                url,
                username: get("TEASER_SMS_USERNAME")
                    .ok_or_else(|| anyhow!("TEASER_SMS_USERNAME missing"))?,
                api_key: get("TEASER_SMS_API_KEY")
                    .ok_or_else(|| anyhow!("TEASER_SMS_API_KEY missing"))?,
            },
        };

        Ok(Self {
            bind,
            code_length,
            ussd_prefix,
            teaser_template: get("TEASER_TEMPLATE")
                .map(|t| t.replace("\\n", "\n"))
                .unwrap_or_else(|| DEFAULT_TEASER_TEMPLATE.to_string()),
            ussd_ack: get("TEASER_USSD_ACK").unwrap_or_else(|| DEFAULT_USSD_ACK.to_string()),
            oracle,
            http_timeout,
            sms,
            directory_seed: get("TEASER_DIRECTORY_SEED").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<ServiceConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_with_only_prefix() {
        let cfg = config(&[("TEASER_USSD_PREFIX", "*384*")]).unwrap();
        assert_eq!(cfg.code_length, 6);
        assert_eq!(cfg.http_timeout, Duration::from_secs(30));
        assert_eq!(cfg.sms, SmsConfig::Log);
        assert_eq!(
            cfg.oracle,
            OracleTarget::Remote {
                base_url: DEFAULT_ORACLE_URL.into(),
                token: None
            }
        );
        assert_eq!(cfg.teaser_template, DEFAULT_TEASER_TEMPLATE);
    }

    #[test]
    fn prefix_is_required() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn legacy_names_are_honoured() {
        let cfg = config(&[("USSD_CODE", "*123*"), ("SMC_API_KEY", "tok")]).unwrap();
        assert_eq!(cfg.ussd_prefix, "*123*");
        assert!(matches!(
            cfg.oracle,
            OracleTarget::Remote { token: Some(ref t), .. } if t == "tok"
        ));
    }

    #[test]
    fn local_oracle_and_http_sms() {
        let cfg = config(&[
            ("TEASER_USSD_PREFIX", "*1*"),
            ("TEASER_ORACLE_URL", "local"),
            ("TEASER_SMS_URL", "https://sms.example/send"),
            ("TEASER_SMS_USERNAME", "sandbox"),
            ("TEASER_SMS_API_KEY", "k"),
        ])
        .unwrap();
        assert_eq!(cfg.oracle, OracleTarget::Local);
        assert!(matches!(cfg.sms, SmsConfig::Http { .. }));
    }

    #[test]
    fn http_sms_needs_credentials() {
        let err = config(&[
            ("TEASER_USSD_PREFIX", "*1*"),
            ("TEASER_SMS_URL", "https://sms.example/send"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("TEASER_SMS_USERNAME"));
    }

    #[test]
    fn template_newlines_unescaped() {
        let cfg = config(&[
            ("TEASER_USSD_PREFIX", "*1*"),
            ("TEASER_TEMPLATE", "{title}\\n{code}"),
        ])
        .unwrap();
        assert_eq!(cfg.teaser_template, "{title}\n{code}");
    }
}
