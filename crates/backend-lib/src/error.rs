// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::{AuthCategory, AuthError, CredentialError};
use crate::notify::NotifyError;
use crate::storage::StorageError;
use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => e.category().status_code(),
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Storage(StorageError::UserNotFound(_)) | AppError::NotFound(_) => {
                StatusCode::NOT_FOUND
            },
            AppError::Storage(StorageError::EmailTaken) | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            },
            AppError::Credential(CredentialError::InvalidSecret) | AppError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            },
            AppError::Notify(NotifyError::Rejected(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(e) => match e.category() {
                AuthCategory::Unauthenticated => "AUTH_001",
                AuthCategory::Forbidden => "AUTH_003",
                AuthCategory::ServerError => "AUTH_004",
            },
            AppError::InvalidCredentials => "AUTH_002",
            AppError::Credential(_) => "CRED_001",
            AppError::Storage(_) => "STORE_001",
            AppError::Notify(_) => "NOTIFY_001",
            AppError::Internal(_) => "INT_001",
            AppError::NotFound(_) => "NF_001",
            AppError::Conflict(_) => "CONFLICT_001",
            AppError::InvalidInput(_) => "VAL_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Auth(e) => match e.category() {
                AuthCategory::Unauthenticated => "Authentication required".to_string(),
                AuthCategory::Forbidden => "Insufficient privileges".to_string(),
                AuthCategory::ServerError => "An internal server error occurred".to_string(),
            },
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::Credential(CredentialError::InvalidSecret) => {
                "Password does not meet requirements".to_string()
            },
            AppError::Storage(StorageError::UserNotFound(_)) | AppError::NotFound(_) => {
                "Resource not found".to_string()
            },
            AppError::Storage(StorageError::EmailTaken) | AppError::Conflict(_) => {
                "Resource already exists".to_string()
            },
            AppError::Notify(_) => "Notification could not be delivered".to_string(),
            AppError::InvalidInput(_) => "Invalid input provided".to_string(),
            _ => "An internal server error occurred".to_string(),
        }
    }

    /// Authentication failures never reveal which check failed
    fn always_sanitized(&self) -> bool {
        matches!(self, AppError::Auth(_) | AppError::InvalidCredentials)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) && !self.always_sanitized() {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
