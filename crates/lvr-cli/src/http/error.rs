//! JSON error envelope for the HTTP API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lvr_core::normalize::{FieldError, ValidationErrors};
use lvr_core::{ErrorCode, Store, StoreError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}: {errors}")]
    Validation {
        message: &'static str,
        errors: ValidationErrors,
    },

    #[error("projection not found")]
    NotFound,

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    error: &'a str,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
    #[serde(skip_serializing_if = "no_details")]
    details: &'a [FieldError],
}

const fn no_details(details: &&[FieldError]) -> bool {
    details.is_empty()
}

impl ApiError {
    #[must_use]
    pub const fn invalid(message: &'static str, errors: ValidationErrors) -> Self {
        Self::Validation { message, errors }
    }

    /// Map a body that is not valid JSON (or not the expected shape) to a
    /// validation failure on `$`.
    #[must_use]
    pub fn from_rejection(message: &'static str, rejection: &JsonRejection) -> Self {
        Self::invalid(message, ValidationErrors::single("$", rejection.body_text()))
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { .. } => ErrorCode::ValidationFailed,
            Self::NotFound => ErrorCode::ProjectionNotFound,
            Self::Store(error) => error.code(),
            Self::Internal(_) => ErrorCode::InternalUnexpected,
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Invalid(errors) => Self::invalid(ErrorCode::ValidationFailed.message(), errors),
            other => Self::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        if status.is_server_error() {
            tracing::error!(error = %self, code = code.code(), "request failed");
        }

        let (message, details): (&str, &[FieldError]) = match &self {
            Self::Validation { message, errors } => (*message, &errors.errors),
            _ => (code.message(), &[]),
        };
        let body = ErrorBody {
            ok: false,
            error: message,
            code: code.code(),
            hint: code.hint(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

/// Run a store operation on the blocking pool.
pub async fn blocking<T, F>(store: &Store, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.clone();
    tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|e| ApiError::Internal(format!("store task failed: {e}")))?
        .map_err(ApiError::from)
}
