// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration, login and role queries.
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use larder_common::{AdminStatus, LoginRequest, LoginResponse, RegisterRequest, UserSummary};

use super::body;
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    let request = body(payload)?;
    let user = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user.summary())))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let request = body(payload)?;
    let (token, user) = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(LoginResponse {
        token,
        user: user.summary(),
    }))
}

/// Whether the caller holds the admin role
pub async fn is_admin(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<AdminStatus>, AppError> {
    let user = state.directory.lookup_user(ctx.user_id).await?;
    Ok(Json(AdminStatus {
        is_admin: user.is_admin,
    }))
}
