// crates/backend-lib/src/middleware/auth.rs

//! Authorization gates for protected routes.
//!
//! On success the resolved [`AuthContext`] is stored in the request
//! extensions for handlers to read. On failure the request never reaches
//! the handler.
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{authorize, AuthContext, AuthError};
use crate::error::AppError;
use crate::metrics::AUTH_FAILURE;
use crate::AppState;

/// Require a valid session token
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = check(&state, request.headers(), false).await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

/// Require a valid session token held by an admin
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = check(&state, request.headers(), true).await?;
    request.extensions_mut().insert(ctx);
    Ok(next.run(request).await)
}

async fn check(
    state: &AppState,
    headers: &HeaderMap,
    requires_elevation: bool,
) -> Result<AuthContext, AppError> {
    authorize(&state.tokens, state.directory.as_ref(), headers, requires_elevation)
        .await
        .map_err(|e| {
            let category = e.category();
            metrics::counter!(AUTH_FAILURE, "category" => category.as_str()).increment(1);
            match &e {
                AuthError::IdentityLookupFailed(detail) => {
                    tracing::error!(detail = %detail, "identity lookup failed during authorization");
                },
                other => tracing::debug!(reason = %other, category = category.as_str(), "request rejected"),
            }
            AppError::Auth(e)
        })
}
