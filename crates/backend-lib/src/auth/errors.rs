// ============================
// crates/backend-lib/src/auth/errors.rs
// ============================
//! Authentication and authorization failures.
use axum::http::StatusCode;
use thiserror::Error;

/// How a failure is reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthCategory {
    /// No usable identity was presented
    Unauthenticated,
    /// Identity is known but lacks privilege
    Forbidden,
    /// Infrastructure failed while deciding
    ServerError,
}

impl AuthCategory {
    pub fn status_code(self) -> StatusCode {
        match self {
            AuthCategory::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthCategory::Forbidden => StatusCode::FORBIDDEN,
            AuthCategory::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Label used for metrics
    pub fn as_str(self) -> &'static str {
        match self {
            AuthCategory::Unauthenticated => "unauthenticated",
            AuthCategory::Forbidden => "forbidden",
            AuthCategory::ServerError => "server_error",
        }
    }
}

/// Errors produced by token validation and the authorization pipeline
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer credential")]
    MissingCredential,

    #[error("malformed token")]
    MalformedToken,

    #[error("token signature mismatch")]
    BadSignature,

    #[error("token expired")]
    Expired,

    #[error("identity lookup failed: {0}")]
    IdentityLookupFailed(String),

    #[error("insufficient privilege")]
    Forbidden,
}

impl AuthError {
    pub fn category(&self) -> AuthCategory {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedToken
            | AuthError::BadSignature
            | AuthError::Expired => AuthCategory::Unauthenticated,
            AuthError::Forbidden => AuthCategory::Forbidden,
            AuthError::IdentityLookupFailed(_) => AuthCategory::ServerError,
        }
    }
}
