//! Error to HTTP response mapping.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use splitzies_core::ingestion::IngestionError;
use splitzies_core::receipt::ReceiptError;
use splitzies_core::storage::StorageError;
use splitzies_shared::AppError;
use tracing::{debug, error};

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An [`AppError`] rendered as `{"error", "message", "field"?}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Validation error bound to a request field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(AppError::invalid_field(field, message))
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<ReceiptError> for ApiError {
    fn from(err: ReceiptError) -> Self {
        Self(err.into())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(err.into())
    }
}

impl From<IngestionError> for ApiError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Upload(storage) => storage.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::invalid_field("body", rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self(AppError::invalid_field("image", err.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self(AppError::invalid_field("body", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() && !matches!(self.0, AppError::ServiceUnavailable(_)) {
            error!(error = %self.0, "Request failed");
            "An internal error occurred".to_string()
        } else {
            debug!(error = %self.0, "Request rejected");
            self.0.message().to_string()
        };

        let mut body = json!({
            "error": self.0.error_code(),
            "message": message,
        });
        if let Some(field) = self.0.field() {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}
