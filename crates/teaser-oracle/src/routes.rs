use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use subtle::ConstantTimeEq;
use teaser_core::protocol::{
    ErrorBody, GetMessageIdRequest, GetMessageIdResponse, GetVcRequest, GetVcResponse,
    HealthBody, GET_MESSAGE_ID_PATH, GET_VC_PATH, HEALTH_PATH,
};
use teaser_core::{CodeError, CodeTransform, Oracle};
use tracing::{debug, info, warn};

use crate::config::OracleConfig;

#[derive(Clone)]
pub struct OracleState {
    oracle: Oracle,
    api_token: Option<Arc<str>>,
}

impl OracleState {
    pub fn new(config: &OracleConfig) -> Result<Self, CodeError> {
        Ok(Self {
            oracle: Oracle::new(CodeTransform::new(config.code_length)?),
            api_token: config.api_token.as_deref().map(Arc::from),
        })
    }

    pub fn code_length(&self) -> usize {
        self.oracle.code_length()
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), Rejection> {
        let Some(expected) = self.api_token.as_deref() else {
            return Ok(());
        };
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or_default();
        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            return Ok(());
        }
        warn!("oracle request with missing or wrong bearer token");
        Err(Rejection {
            status: StatusCode::UNAUTHORIZED,
            body: ErrorBody {
                error: "Unauthorized".into(),
                message: "missing or invalid bearer token".into(),
                required: vec![],
            },
        })
    }
}

pub fn router(state: OracleState) -> Router {
    Router::new()
        .route(GET_VC_PATH, post(get_vc))
        .route(GET_MESSAGE_ID_PATH, post(get_message_id))
        .route(HEALTH_PATH, get(healthz))
        .with_state(state)
}

#[derive(Debug)]
pub struct Rejection {
    status: StatusCode,
    body: ErrorBody,
}

impl Rejection {
    fn bad_request(body: ErrorBody) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body,
        }
    }
}

impl From<JsonRejection> for Rejection {
    fn from(err: JsonRejection) -> Self {
        Self::bad_request(ErrorBody::invalid(err.body_text()))
    }
}

impl From<CodeError> for Rejection {
    fn from(err: CodeError) -> Self {
        Self::bad_request(ErrorBody::invalid(err.to_string()))
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn present(field: Option<String>) -> Option<String> {
    field.filter(|v| !v.is_empty())
}

async fn get_vc(
    State(state): State<OracleState>,
    headers: HeaderMap,
    payload: Result<Json<GetVcRequest>, JsonRejection>,
) -> Result<Json<GetVcResponse>, Rejection> {
    state.authorize(&headers)?;
    let Json(req) = payload?;
    let (Some(message_id), Some(secret)) = (present(req.message_id), present(req.secret_key))
    else {
        return Err(Rejection::bad_request(ErrorBody::missing(&[
            "message_id",
            "secret_key",
        ])));
    };

    let vc = state
        .oracle
        .encode(&secret, req.secret_encoding, &message_id)
        .map_err(|e| {
            warn!(error = %e, "get-vc rejected");
            Rejection::from(e)
        })?;
    info!(id_digits = message_id.len(), "verification code issued");
    debug!(%vc, "issued code");
    Ok(Json(GetVcResponse { vc }))
}

async fn get_message_id(
    State(state): State<OracleState>,
    headers: HeaderMap,
    payload: Result<Json<GetMessageIdRequest>, JsonRejection>,
) -> Result<Json<GetMessageIdResponse>, Rejection> {
    state.authorize(&headers)?;
    let Json(req) = payload?;
    let (Some(vc), Some(secret)) = (present(req.vc), present(req.secret_key)) else {
        return Err(Rejection::bad_request(ErrorBody::missing(&[
            "vc",
            "secret_key",
        ])));
    };

    let message_id = state
        .oracle
        .decode(&secret, req.secret_encoding, &vc)
        .map_err(|e| {
            warn!(error = %e, "get-messageID rejected");
            Rejection::from(e)
        })?;
    info!("verification code reversed");
    Ok(Json(GetMessageIdResponse { message_id }))
}

async fn healthz() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn state_with_token(token: Option<&str>) -> OracleState {
        OracleState::new(&OracleConfig {
            api_token: token.map(str::to_string),
            ..OracleConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn open_oracle_accepts_anything() {
        assert!(state_with_token(None).authorize(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn bearer_token_is_checked() {
        let state = state_with_token(Some("t0ken"));
        let mut headers = HeaderMap::new();
        assert_eq!(
            state.authorize(&headers).unwrap_err().status,
            StatusCode::UNAUTHORIZED
        );
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert!(state.authorize(&headers).is_err());
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t0ken"));
        assert!(state.authorize(&headers).is_ok());
    }

    #[test]
    fn bad_length_config_fails_fast() {
        let err = OracleState::new(&OracleConfig {
            code_length: 4,
            ..OracleConfig::default()
        })
        .err()
        .unwrap();
        assert_eq!(err, CodeError::UnsupportedLength(4));
    }
}
