use anyhow::{anyhow, Result};
use std::sync::Arc;
use teaser_core::{CodeTransform, Oracle};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{OracleTarget, ServiceConfig, SmsConfig};
use crate::delivery::{DeliveryOrchestrator, TeaserTemplate};
use crate::directory::{Directory, MemoryDirectory};
use crate::oracle_client::{CodeOracle, LocalOracle, OracleClient};
use crate::sms::{HttpSmsGateway, LogGateway, SmsGateway};
use crate::ussd::{UssdEntry, VerificationOutcome};
use crate::verification::VerificationOrchestrator;

/// Wired collaborators for one running service.
pub struct App {
    pub delivery: Arc<DeliveryOrchestrator>,
    pub verification: Arc<VerificationOrchestrator>,
    pub ussd: Arc<UssdEntry>,
}

impl App {
    pub fn new(
        config: &ServiceConfig,
        directory: Arc<dyn Directory>,
        oracle: Arc<dyn CodeOracle>,
        sms: Arc<dyn SmsGateway>,
        sink: Option<mpsc::UnboundedSender<VerificationOutcome>>,
    ) -> Self {
        let template = TeaserTemplate::new(
            config.teaser_template.clone(),
            config.ussd_prefix.clone(),
        );
        let delivery = Arc::new(DeliveryOrchestrator::new(
            directory.clone(),
            oracle.clone(),
            sms.clone(),
            template,
        ));
        let verification = Arc::new(VerificationOrchestrator::new(directory, oracle, sms));
        let mut ussd = UssdEntry::new(verification.clone(), config.ussd_ack.clone());
        if let Some(sink) = sink {
            ussd = ussd.with_sink(sink);
        }
        Self {
            delivery,
            verification,
            ussd: Arc::new(ussd),
        }
    }

    /// Build every collaborator from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let directory: Arc<dyn Directory> = match &config.directory_seed {
            Some(path) => {
                let dir = MemoryDirectory::load(path)?;
                info!(
                    path = %path.display(),
                    recipients = dir.recipient_count(),
                    advisories = dir.advisory_count(),
                    "directory loaded"
                );
                Arc::new(dir)
            }
            None => {
                warn!("TEASER_DIRECTORY_SEED unset; directory is empty");
                Arc::new(MemoryDirectory::default())
            }
        };

        let oracle: Arc<dyn CodeOracle> = match &config.oracle {
            OracleTarget::Remote { base_url, token } => {
                info!(%base_url, "using remote oracle");
                Arc::new(OracleClient::new(base_url, token.clone(), config.http_timeout)?)
            }
            OracleTarget::Local => {
                let transform = CodeTransform::new(config.code_length)
                    .map_err(|e| anyhow!("TEASER_CODE_LENGTH: {e}"))?;
                info!(code_length = config.code_length, "using in-process oracle");
                Arc::new(LocalOracle(Oracle::new(transform)))
            }
        };

        let sms: Arc<dyn SmsGateway> = match &config.sms {
            SmsConfig::Log => {
                warn!("TEASER_SMS_URL unset; messages are logged, not sent");
                Arc::new(LogGateway::new())
            }
            SmsConfig::Http {
                url,
                username,
                api_key,
            } => Arc::new(HttpSmsGateway::new(url, username, api_key, config.http_timeout)?),
        };

        Ok(Self::new(config, directory, oracle, sms, None))
    }
}
