// ============================
// crates/backend-lib/src/auth/pipeline.rs
// ============================
//! Request authorization.
//!
//! Every protected request runs the same chain: pull the bearer credential
//! from the headers, validate it, attach the identity and, for admin routes
//! only, confirm the user holds the admin role. The first failing stage ends
//! the chain. Nothing here writes to storage.
use axum::http::{header::AUTHORIZATION, HeaderMap};
use larder_common::UserId;

use super::{AuthError, TokenService};
use crate::storage::{StorageError, UserDirectory};

const BEARER_SCHEME: &str = "bearer";

/// Identity resolved for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    /// `Some(true)` once the privilege check ran and passed
    pub elevated: Option<bool>,
}

/// Extract the bearer token from the `Authorization` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredential)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingCredential)?;

    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::MissingCredential);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

/// Run the authorization chain for one request
pub async fn authorize(
    tokens: &TokenService,
    directory: &dyn UserDirectory,
    headers: &HeaderMap,
    requires_elevation: bool,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    let user_id = tokens.validate(token)?;

    let mut ctx = AuthContext {
        user_id,
        elevated: None,
    };

    if requires_elevation {
        let user = match directory.lookup_user(user_id).await {
            Ok(user) => user,
            // A token can outlive its account
            Err(StorageError::UserNotFound(_)) => return Err(AuthError::Forbidden),
            Err(e) => return Err(AuthError::IdentityLookupFailed(e.to_string())),
        };

        if !user.is_admin {
            return Err(AuthError::Forbidden);
        }
        ctx.elevated = Some(true);
    }

    Ok(ctx)
}
