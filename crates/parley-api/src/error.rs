use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use parley_types::api::{ErrorBody, FieldError};

/// Errors surfaced at the request boundary.
///
/// Delivery failures never appear here: Message Intake logs them and still
/// reports the stored message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid credentials")]
    Unauthorized,

    /// Caller is not a participant of an existing conversation.
    #[error("not a participant of this conversation")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Malformed input is a validation failure like any other, so it gets the
// same 400 body with a field list instead of axum's plain-text rejection.

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::invalid("query", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid("path", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::Internal(e) => {
                error!("Internal error: {:#}", e);
                ErrorBody {
                    error: "internal server error".into(),
                    fields: Vec::new(),
                }
            }
            Self::Validation(fields) => ErrorBody {
                error: "validation failed".into(),
                fields,
            },
            other => ErrorBody {
                error: other.to_string(),
                fields: Vec::new(),
            },
        };
        (status, Json(body)).into_response()
    }
}
