use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use keystone_core::{FieldViolation, KeystoneError};
use serde::Serialize;
use tracing::error;

/// An error returned to HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// The brief was rejected before any agent ran.
    Validation(Vec<FieldViolation>),
    /// Anything else. The detail is logged, not returned.
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<&'a [FieldViolation]>,
}

impl From<KeystoneError> for ApiError {
    fn from(err: KeystoneError) -> Self {
        match err {
            KeystoneError::Validation(v) => ApiError::Validation(v.violations),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(violations) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorBody {
                    error: "validation_error",
                    violations: Some(&violations),
                }),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "internal_error",
                        violations: None,
                    }),
                )
                    .into_response()
            }
        }
    }
}
