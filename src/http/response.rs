//! Error-to-response mapping.
//!
//! # Design Decisions
//! - Datastore unavailability maps to 503 with `Retry-After`
//! - Every error body is `{ "error": <code>, "message": <text> }`
//! - Degraded reads are 200 with `x-degraded-mode: true`

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::gate::GateError;
use crate::users::StoreError;

pub const X_DEGRADED_MODE: &str = "x-degraded-mode";

/// Seconds suggested to clients when the datastore is unavailable.
const RETRY_AFTER_SECS: &str = "5";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unavailable(#[from] GateError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("missing or invalid credentials")]
    Unauthorized,
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound(e.to_string()),
            StoreError::Conflict { .. } => ApiError::Conflict(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unavailable(_) => "service_unavailable",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Wrap a placeholder payload as a degraded 200 response.
pub fn degraded<T: serde::Serialize>(payload: T) -> Response {
    let mut response = Json(payload).into_response();
    response
        .headers_mut()
        .insert(X_DEGRADED_MODE, HeaderValue::from_static("true"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{BackendKind, ConnectionState};

    #[test]
    fn test_unavailable_maps_to_503_with_retry_after() {
        let err = ApiError::from(GateError::ServiceUnavailable {
            backend: BackendKind::Primary,
            state: ConnectionState::Failed,
            operation: "create",
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::RETRY_AFTER], "5");
    }

    #[test]
    fn test_store_errors_map_to_status() {
        assert_eq!(ApiError::from(StoreError::NotFound("x".into())).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(StoreError::Conflict { field: "email", value: "a@b".into() }).status(),
            StatusCode::CONFLICT
        );
    }
}
