//! HTTP front: trigger deliveries and receive USSD callbacks.

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use teaser_core::protocol::{ErrorBody, HealthBody, HEALTH_PATH};
use tracing::{info, warn};

use crate::app::App;
use crate::delivery::{DeliveryOrchestrator, DeliveryRequest};
use crate::outcome::FailureKind;
use crate::ussd::UssdEntry;
use crate::verification::VerificationRequest;

pub const ADVISORY_PATH: &str = "/advisory";
pub const USSD_PATH: &str = "/ussd";

#[derive(Clone)]
pub struct AppState {
    delivery: Arc<DeliveryOrchestrator>,
    ussd: Arc<UssdEntry>,
}

impl From<&App> for AppState {
    fn from(app: &App) -> Self {
        Self {
            delivery: app.delivery.clone(),
            ussd: app.ussd.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ADVISORY_PATH, post(send_advisory))
        .route(USSD_PATH, post(ussd_callback))
        .route(HEALTH_PATH, get(healthz))
        .with_state(state)
}

/// Form fields as posted by the USSD aggregator.
#[derive(Debug, Deserialize)]
pub struct UssdForm {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(rename = "serviceCode", default)]
    pub service_code: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}

async fn send_advisory(
    State(state): State<AppState>,
    payload: Result<Json<DeliveryRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(p) => p,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::invalid(e.body_text())),
            )
                .into_response()
        }
    };
    if req.message_id.is_empty() || req.recipient.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::missing(&["message_id", "phone_number"])),
        )
            .into_response();
    }

    let outcome = state.delivery.deliver(&req).await;
    (outcome_status(outcome.kind()), Json(outcome)).into_response()
}

fn outcome_status(kind: Option<FailureKind>) -> StatusCode {
    match kind {
        None => StatusCode::OK,
        Some(FailureKind::Validation) => StatusCode::BAD_REQUEST,
        Some(FailureKind::NotFound) | Some(FailureKind::DecodeMismatch) => StatusCode::NOT_FOUND,
        Some(FailureKind::Transport) => StatusCode::BAD_GATEWAY,
    }
}

async fn ussd_callback(
    State(state): State<AppState>,
    payload: Result<Form<UssdForm>, FormRejection>,
) -> Response {
    let ack = match payload {
        Ok(Form(form)) => {
            info!(
                session = form.session_id.as_deref().unwrap_or("-"),
                recipient = %form.phone_number,
                "ussd callback"
            );
            // dropping the handle detaches the task
            state
                .ussd
                .dispatch(VerificationRequest {
                    recipient: form.phone_number,
                    service_code: form.service_code,
                    text: form.text,
                })
                .ack
        }
        Err(e) => {
            warn!(error = %e.body_text(), "unusable ussd callback; acknowledged without verifying");
            state.ussd.ack().to_string()
        }
    };
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], ack).into_response()
}

async fn healthz() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".into(),
    })
}
