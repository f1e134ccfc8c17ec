//! Phase two: release the full advisory.
//!
//! CODE_RECEIVED -> KEY_RESOLVED -> IDENTIFIER_RECOVERED -> ADVISORY_RESOLVED -> DELIVERED

use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use crate::delivery::{lookup_kind, oracle_kind};
use crate::directory::{Directory, DirectoryError};
use crate::oracle_client::CodeOracle;
use crate::outcome::{Attempt, FailureKind, Outcome, Step, VerificationState};
use crate::sms::SmsGateway;

/// What the USSD channel hands over: who dialled, the dialled menu string
/// and any free text typed into the menu.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationRequest {
    pub recipient: String,
    #[serde(default)]
    pub service_code: String,
    #[serde(default)]
    pub text: String,
}

/// Free text wins; otherwise the code sits between the last `*` and the
/// following `#` of the menu string (`*384*12#*654321#` -> `654321`).
pub fn extract_code(service_code: &str, text: &str) -> Option<String> {
    let text = text.trim();
    if !text.is_empty() {
        return Some(text.to_string());
    }
    let (_, last) = service_code.rsplit_once('*')?;
    let code = last.split('#').next().unwrap_or_default().trim();
    if code.is_empty() {
        return None;
    }
    Some(code.to_string())
}

pub struct VerificationOrchestrator {
    directory: Arc<dyn Directory>,
    oracle: Arc<dyn CodeOracle>,
    sms: Arc<dyn SmsGateway>,
}

impl VerificationOrchestrator {
    pub fn new(
        directory: Arc<dyn Directory>,
        oracle: Arc<dyn CodeOracle>,
        sms: Arc<dyn SmsGateway>,
    ) -> Self {
        Self {
            directory,
            oracle,
            sms,
        }
    }

    pub async fn verify(&self, req: &VerificationRequest) -> Outcome<VerificationState> {
        let mut attempt = Attempt::start(&req.recipient, VerificationState::CodeReceived);

        let Some(code) = extract_code(&req.service_code, &req.text) else {
            return attempt.fail(
                Step::VcExtraction,
                FailureKind::Validation,
                format!("no verification code in menu string {:?}", req.service_code),
            );
        };
        attempt.verification_code = Some(code.clone());

        let secret = match self.directory.lookup_secret_by_recipient(&req.recipient).await {
            Ok(secret) => secret,
            Err(e) => return attempt.fail(Step::FarmerLookup, lookup_kind(&e), e.to_string()),
        };
        attempt.advance(VerificationState::KeyResolved);

        let message_id = match self.oracle.decode(&secret, &code).await {
            Ok(id) => id,
            Err(e) => return attempt.fail(Step::SmcProcessing, oracle_kind(&e), e.to_string()),
        };
        attempt.message_id = Some(message_id.clone());
        attempt.advance(VerificationState::IdentifierRecovered);

        let body = match self.directory.lookup_advisory_body(&message_id).await {
            Ok(body) => body,
            Err(DirectoryError::NotFound(what)) => {
                // Any well-formed code decodes to some id; a miss here is a wrong
                // or guessed code.
                warn!(
                    attempt = %attempt.id(),
                    recipient = %req.recipient,
                    "decoded code matches no advisory; possible guessing attempt"
                );
                return attempt.fail(
                    Step::AdvisoryLookup,
                    FailureKind::DecodeMismatch,
                    format!("Record not found: {what}"),
                );
            }
            Err(e) => return attempt.fail(Step::AdvisoryLookup, lookup_kind(&e), e.to_string()),
        };
        attempt.advance(VerificationState::AdvisoryResolved);

        attempt.sms_content = Some(body.clone());
        if let Err(e) = self.sms.send(&req.recipient, &body).await {
            return attempt.fail(Step::SmsSending, FailureKind::Transport, e.to_string());
        }
        attempt.advance(VerificationState::Delivered);
        attempt.succeed()
    }
}
