//! Application error types.
//!
//! Every fallible operation in the workspace returns [`AppResult`]. Errors that
//! reach an HTTP handler are rendered through [`ApiResponse::err`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::response::ApiResponse;

/// Result alias used across all crates.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload failed field validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Malformed inbound request.
    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// Unsupported database engine requested for instance creation.
    #[error("{0}")]
    InvalidEngine(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Access or identity token could not be obtained.
    #[error("credential error: {0}")]
    Credential(String),

    /// An upstream HTTP service failed or answered unexpectedly.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Missing or unparsable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::InvalidEngine(_) => "INVALID_ENGINE",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Credential(_) => "CREDENTIAL_ERROR",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status used when the error is returned from a handler.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) | AppError::InvalidEngine(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Credential(_) | AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    /// Renders the error with the serving service and request id in `meta`.
    pub fn into_response_with(self, service: &str, request_id: &str) -> Response {
        self.render(
            ApiResponse::err(self.code(), self.to_string())
                .with_service(service)
                .with_request_id(request_id),
        )
    }

    fn render(&self, body: ApiResponse<()>) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::warn!(code = self.code(), error = %self, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.render(ApiResponse::err(self.code(), self.to_string()))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalService(err.to_string())
    }
}
