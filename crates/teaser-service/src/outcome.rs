//! Structured results of a delivery or verification attempt.
//!
//! Orchestrators never return `Err`: every failure is caught at the step where
//! it happened and folded into an [`Outcome`] tagged with that step.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Step names as reported to callers and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    VcExtraction,
    FarmerLookup,
    AdvisoryLookup,
    SmcProcessing,
    SmsSending,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::VcExtraction => "VC_EXTRACTION",
            Step::FarmerLookup => "FARMER_LOOKUP",
            Step::AdvisoryLookup => "ADVISORY_LOOKUP",
            Step::SmcProcessing => "SMC_PROCESSING",
            Step::SmsSending => "SMS_SENDING",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Validation,
    NotFound,
    Transport,
    /// A well-formed code decoded to an identifier with no advisory behind it.
    DecodeMismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryState {
    Requested,
    KeyResolved,
    CodeObtained,
    Composed,
    Sent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationState {
    CodeReceived,
    KeyResolved,
    IdentifierRecovered,
    AdvisoryResolved,
    Delivered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub step: Step,
    pub kind: FailureKind,
    #[serde(rename = "error")]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Outcome<S> {
    pub attempt_id: Uuid,
    pub success: bool,
    /// Furthest state reached before success or failure.
    pub state: S,
    #[serde(flatten)]
    pub failure: Option<Failure>,
    pub recipient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_content: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl<S> Outcome<S> {
    pub fn step(&self) -> Option<Step> {
        self.failure.as_ref().map(|f| f.step)
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    pub fn reason(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.reason.as_str())
    }
}

/// In-flight attempt; consumed into an [`Outcome`].
pub(crate) struct Attempt<S> {
    id: Uuid,
    state: S,
    recipient: String,
    pub verification_code: Option<String>,
    pub message_id: Option<String>,
    pub sms_content: Option<String>,
}

impl<S: Copy + fmt::Debug> Attempt<S> {
    pub fn start(recipient: &str, initial: S) -> Self {
        let id = Uuid::new_v4();
        debug!(attempt = %id, %recipient, state = ?initial, "attempt started");
        Self {
            id,
            state: initial,
            recipient: recipient.to_string(),
            verification_code: None,
            message_id: None,
            sms_content: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn advance(&mut self, state: S) {
        debug!(attempt = %self.id, state = ?state, "attempt advanced");
        self.state = state;
    }

    pub fn fail(self, step: Step, kind: FailureKind, reason: impl Into<String>) -> Outcome<S> {
        let reason = reason.into();
        warn!(
            attempt = %self.id,
            recipient = %self.recipient,
            %step,
            ?kind,
            state = ?self.state,
            %reason,
            "attempt failed"
        );
        self.finish(Some(Failure { step, kind, reason }))
    }

    pub fn succeed(self) -> Outcome<S> {
        info!(
            attempt = %self.id,
            recipient = %self.recipient,
            state = ?self.state,
            "attempt succeeded"
        );
        self.finish(None)
    }

    fn finish(self, failure: Option<Failure>) -> Outcome<S> {
        Outcome {
            attempt_id: self.id,
            success: failure.is_none(),
            state: self.state,
            failure,
            recipient: self.recipient,
            verification_code: self.verification_code,
            message_id: self.message_id,
            sms_content: self.sms_content,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_flat() {
        let attempt = Attempt::start("+254700000001", DeliveryState::Requested);
        let outcome = attempt.fail(
            Step::SmcProcessing,
            FailureKind::Transport,
            "connection refused",
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["step"], "SMC_PROCESSING");
        assert_eq!(json["kind"], "transport");
        assert_eq!(json["error"], "connection refused");
        assert_eq!(json["state"], "REQUESTED");
    }

    #[test]
    fn success_has_no_step() {
        let mut attempt = Attempt::start("+1", VerificationState::CodeReceived);
        attempt.advance(VerificationState::Delivered);
        let outcome = attempt.succeed();
        assert!(outcome.success);
        assert_eq!(outcome.step(), None);
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("step").is_none());
        assert_eq!(json["state"], "DELIVERED");
    }
}
