//! HTTP error taxonomy.
//!
//! DESIGN
//! ======
//! Every handler returns `Result<_, ApiError>`. Storage and validation errors
//! are converted at the handler boundary into a status code plus a JSON body
//! `{"error": <message>, "code": <stable code>, "retryable": <bool>}`;
//! nothing escapes as an unhandled failure. Panics are caught one layer further out by the
//! router's catch-panic layer (see `routes::panic_response`).

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::store::StoreError;

/// Stable machine-readable error codes.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    /// Whether the same request may succeed later unchanged.
    fn retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "E_STORAGE_UNAVAILABLE",
            Self::NotFound(_) => "E_NOT_FOUND",
            Self::BadRequest(_) => "E_BAD_REQUEST",
            Self::Internal(_) => "E_INTERNAL",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::Unavailable(msg),
            StoreError::NotFound { collection, id } => Self::NotFound(format!("{} {id}", collection.singular())),
            StoreError::InvalidDocument(msg) => Self::BadRequest(msg),
            StoreError::Io(e) => Self::Unavailable(e.to_string()),
            other @ (StoreError::Json(_) | StoreError::Database(_)) => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, code = self.error_code(), "request failed");
        }
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.error_code(),
            "retryable": self.retryable(),
        });
        (status, Json(body)).into_response()
    }
}
