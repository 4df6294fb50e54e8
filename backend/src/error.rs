//! Error handling for the Inventory Forecast Platform
//!
//! Every failure a service can raise maps to one variant here; handlers turn
//! them into `{ "error": { code, message, field } }` responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ValidationError;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Projection index {index} out of range 0..{len}")]
    InvalidIndex { index: i64, len: usize },

    #[error("Field {0} cannot be modified")]
    ProtectedField(String),

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Ingestion job errors
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Ingestion job failed: {0}")]
    UpstreamFailure(String),

    #[error("Invalid snapshot data: {0}")]
    InvalidSnapshot(String),

    // Persistence errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // External service errors
    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IndexOutOfRange { index, len } => AppError::InvalidIndex { index, len },
            ValidationError::ProtectedField(field) => AppError::ProtectedField(field),
            ValidationError::NotFinite { ref field }
            | ValidationError::NegativeQuantity { ref field }
            | ValidationError::OutOfRange { ref field, .. } => AppError::Validation {
                field: field.clone(),
                message: err.to_string(),
            },
            other => AppError::ValidationError(other.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } | AppError::ValidationError(_) => "INVALID_INPUT",
            AppError::InvalidIndex { .. } => "INVALID_INDEX",
            AppError::ProtectedField(_) => "PROTECTED_FIELD",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
            AppError::InvalidSnapshot(_) => "INVALID_SNAPSHOT",
            AppError::Io(_) => "IO_FAILURE",
            AppError::Notification(_) => "NOTIFICATION_FAILED",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::ValidationError(_)
            | AppError::InvalidIndex { .. } => StatusCode::BAD_REQUEST,
            AppError::ProtectedField(_) => StatusCode::FORBIDDEN,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamFailure(_) | AppError::Notification(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidSnapshot(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Io(_)
            | AppError::Configuration(_)
            | AppError::Internal(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (message, field) = match &self {
            AppError::Validation { field, message } => (message.clone(), Some(field.clone())),
            AppError::ProtectedField(field) => (self.to_string(), Some(field.clone())),
            AppError::Conflict { resource, message } => (message.clone(), Some(resource.clone())),
            AppError::NotFound(resource) => (format!("{} not found", resource), None),
            AppError::Io(_) => ("Snapshot storage is unavailable".to_string(), None),
            AppError::InternalError(_) => ("An internal server error occurred".to_string(), None),
            _ => (self.to_string(), None),
        };

        // Log the error for debugging
        if self.status().is_server_error() {
            tracing::error!(code = self.code(), "Error: {:?}", self);
        } else {
            tracing::warn!(code = self.code(), "Error: {:?}", self);
        }

        let detail = ErrorDetail {
            code: self.code().to_string(),
            message,
            field,
        };

        (self.status(), Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
