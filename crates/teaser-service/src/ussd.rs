//! USSD entry point.
//!
//! The channel needs an answer now, but verification crosses the network
//! three times. `UssdEntry::dispatch` returns the fixed acknowledgment at once
//! and runs the verification on a spawned task. The eventual outcome is
//! logged, pushed to the optional result sink, and returned through the
//! task's `JoinHandle`.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::outcome::{Outcome, VerificationState};
use crate::verification::{VerificationOrchestrator, VerificationRequest};

pub const DEFAULT_USSD_ACK: &str =
    "END Thank you. If your code is valid, the full advisory will arrive by SMS shortly.";

pub type VerificationOutcome = Outcome<VerificationState>;

pub struct Dispatched {
    pub ack: String,
    pub handle: JoinHandle<VerificationOutcome>,
}

pub struct UssdEntry {
    orchestrator: Arc<VerificationOrchestrator>,
    ack: String,
    sink: Option<mpsc::UnboundedSender<VerificationOutcome>>,
}

impl UssdEntry {
    pub fn new(orchestrator: Arc<VerificationOrchestrator>, ack: impl Into<String>) -> Self {
        Self {
            orchestrator,
            ack: ack.into(),
            sink: None,
        }
    }

    /// Publish every finished verification to `sink`.
    pub fn with_sink(mut self, sink: mpsc::UnboundedSender<VerificationOutcome>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn ack(&self) -> &str {
        &self.ack
    }

    pub fn dispatch(&self, req: VerificationRequest) -> Dispatched {
        let orchestrator = self.orchestrator.clone();
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            let outcome = orchestrator.verify(&req).await;
            match &outcome.failure {
                None => info!(
                    attempt = %outcome.attempt_id,
                    recipient = %outcome.recipient,
                    "background verification delivered advisory"
                ),
                Some(failure) => error!(
                    attempt = %outcome.attempt_id,
                    recipient = %outcome.recipient,
                    step = %failure.step,
                    reason = %failure.reason,
                    "background verification failed"
                ),
            }
            if let Some(sink) = sink {
                // receiver gone means nobody is watching; the log line above stands
                let _ = sink.send(outcome.clone());
            }
            outcome
        });
        Dispatched {
            ack: self.ack.clone(),
            handle,
        }
    }
}
