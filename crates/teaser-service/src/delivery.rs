//! Phase one: send the teaser.
//!
//! REQUESTED -> KEY_RESOLVED -> CODE_OBTAINED -> COMPOSED -> SENT
//!
//! Re-running a delivery for the same advisory and recipient is safe: the
//! oracle returns the same code, so the recipient gets an equivalent teaser
//! (and a duplicate SMS).

use serde::Deserialize;
use std::sync::Arc;

use crate::directory::{Directory, DirectoryError};
use crate::oracle_client::{CodeOracle, OracleError};
use crate::outcome::{Attempt, DeliveryState, FailureKind, Outcome, Step};
use crate::sms::SmsGateway;

pub const DEFAULT_TEASER_TEMPLATE: &str =
    "{title}\nThis is your verification code: {code}\nDial {ussd_prefix}{code}# to verify.";

/// Teaser text with `{title}`, `{code}` and `{ussd_prefix}` placeholders.
/// Substitution is a single pass, so placeholder-like text inside a title is
/// left alone.
#[derive(Debug, Clone)]
pub struct TeaserTemplate {
    pub template: String,
    pub ussd_prefix: String,
}

impl TeaserTemplate {
    pub fn new(template: impl Into<String>, ussd_prefix: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ussd_prefix: ussd_prefix.into(),
        }
    }

    pub fn compose(&self, title: &str, code: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + title.len() + 2 * code.len());
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let Some(close) = tail.find('}') else {
                rest = tail;
                break;
            };
            match &tail[1..close] {
                "title" => out.push_str(title),
                "code" => out.push_str(code),
                "ussd_prefix" => out.push_str(&self.ussd_prefix),
                _ => out.push_str(&tail[..=close]),
            }
            rest = &tail[close + 1..];
        }
        out.push_str(rest);
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryRequest {
    pub message_id: String,
    #[serde(alias = "phone_number")]
    pub recipient: String,
}

pub struct DeliveryOrchestrator {
    directory: Arc<dyn Directory>,
    oracle: Arc<dyn CodeOracle>,
    sms: Arc<dyn SmsGateway>,
    template: TeaserTemplate,
}

impl DeliveryOrchestrator {
    pub fn new(
        directory: Arc<dyn Directory>,
        oracle: Arc<dyn CodeOracle>,
        sms: Arc<dyn SmsGateway>,
        template: TeaserTemplate,
    ) -> Self {
        Self {
            directory,
            oracle,
            sms,
            template,
        }
    }

    pub async fn deliver(&self, req: &DeliveryRequest) -> Outcome<DeliveryState> {
        let mut attempt = Attempt::start(&req.recipient, DeliveryState::Requested);
        attempt.message_id = Some(req.message_id.clone());

        let secret = match self.directory.lookup_secret_by_recipient(&req.recipient).await {
            Ok(secret) => secret,
            Err(e) => return attempt.fail(Step::FarmerLookup, lookup_kind(&e), e.to_string()),
        };
        let title = match self.directory.lookup_advisory_title(&req.message_id).await {
            Ok(title) => title,
            Err(e) => return attempt.fail(Step::AdvisoryLookup, lookup_kind(&e), e.to_string()),
        };
        attempt.advance(DeliveryState::KeyResolved);

        let code = match self.oracle.encode(&secret, &req.message_id).await {
            Ok(code) => code,
            Err(e) => return attempt.fail(Step::SmcProcessing, oracle_kind(&e), e.to_string()),
        };
        attempt.verification_code = Some(code.clone());
        attempt.advance(DeliveryState::CodeObtained);

        let text = self.template.compose(&title, &code);
        attempt.sms_content = Some(text.clone());
        attempt.advance(DeliveryState::Composed);

        if let Err(e) = self.sms.send(&req.recipient, &text).await {
            return attempt.fail(Step::SmsSending, FailureKind::Transport, e.to_string());
        }
        attempt.advance(DeliveryState::Sent);
        attempt.succeed()
    }
}

pub(crate) fn lookup_kind(err: &DirectoryError) -> FailureKind {
    match err {
        DirectoryError::NotFound(_) => FailureKind::NotFound,
        DirectoryError::Backend(_) => FailureKind::Transport,
    }
}

pub(crate) fn oracle_kind(err: &OracleError) -> FailureKind {
    match err {
        OracleError::Rejected(_) => FailureKind::Validation,
        OracleError::Status(_) | OracleError::Transport(_) | OracleError::Malformed(_) => {
            FailureKind::Transport
        }
    }
}
