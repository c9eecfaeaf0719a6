use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use seolink_core::RedirectError;
use tracing::{debug, error};

use crate::model::ErrorBody;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    Redirect(RedirectError),
    /// Multi-tenant request without a usable `x-owner-id` header.
    MissingOwner,
    /// The request body could not be read as JSON of the expected shape.
    Body(JsonRejection),
}

impl From<RedirectError> for AppError {
    fn from(value: RedirectError) -> Self {
        Self::Redirect(value)
    }
}

impl From<JsonRejection> for AppError {
    fn from(value: JsonRejection) -> Self {
        Self::Body(value)
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Redirect(RedirectError::Validation { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed")
            }
            AppError::Redirect(RedirectError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Redirect(RedirectError::Unauthorized(_)) => (StatusCode::FORBIDDEN, "forbidden"),
            AppError::Redirect(RedirectError::StorageUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable")
            }
            AppError::Redirect(RedirectError::Storage(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
            AppError::MissingOwner => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            AppError::Body(rejection) => (rejection.status(), "invalid_body"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Redirect(e) => e.to_string(),
            AppError::MissingOwner => "missing x-owner-id header".to_string(),
            AppError::Body(rejection) => rejection.body_text(),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            debug!(%status, %message, "request rejected");
        }

        let body = ErrorBody {
            error: code,
            message,
        };
        (status, Json(body)).into_response()
    }
}
