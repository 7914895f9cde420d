//! HTTP adapter for the validation service.
//!
//! ```text
//! POST /validate        {value, fieldType, validationRules} -> {isValid, message?}
//! POST /api/validate    alias of /validate
//! GET  /health          provider readiness
//! ```
//!
//! Every request that reaches the service gets a 200 with a verdict,
//! including the safe default. Only configuration failures produce a 500,
//! and only malformed bodies a 400.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::net::TcpListener;

use formcheck_core::{log_snippet, ValidationRequest};

use super::{API_VALIDATE_PATH, HEALTH_PATH, INVALID_REQUEST_MESSAGE, VALIDATE_PATH};
use crate::service::ValidationService;

#[derive(Clone)]
struct AppState {
    service: ValidationService,
}

/// Error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Health response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub provider: String,
}

/// Build the router for a service.
pub fn router(service: ValidationService) -> Router {
    Router::new()
        .route(VALIDATE_PATH, post(validate_field))
        .route(API_VALIDATE_PATH, post(validate_field))
        .route(HEALTH_PATH, get(health))
        .with_state(AppState { service })
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<F>(
    listener: TcpListener,
    service: ValidationService,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, provider = service.provider_name(), "Validation endpoint listening");

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Caller bearer token. Held opaque; never logged or verified here.
fn bearer_token(headers: &HeaderMap) -> Option<SecretString> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(SecretString::from(token.to_string()))
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn validate_field(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ValidationRequest>, JsonRejection>,
) -> Response {
    let caller = bearer_token(&headers);
    tracing::debug!(bearer = caller.is_some(), "Validation request received");

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!(
                error = %log_snippet(&rejection.body_text()),
                "Rejected malformed validation request"
            );
            return error_response(StatusCode::BAD_REQUEST, INVALID_REQUEST_MESSAGE);
        }
    };

    match state.service.validate(&request).await {
        Ok(verdict) => (StatusCode::OK, Json(verdict)).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error.public_message()),
    }
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let (code, status) = if state.service.health_check().await {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        code,
        Json(HealthBody {
            status: status.to_string(),
            provider: state.service.provider_name().to_string(),
        }),
    )
}
