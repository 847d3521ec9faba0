// ============================
// crates/backend-lib/src/handlers/user.rs
// ============================
//! Handlers for the signed-in user.
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use larder_common::{DeliveryTargetRequest, UpdateUserRequest, UserSummary};
use serde_json::{json, Value};

use super::body;
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::validation;
use crate::AppState;

pub async fn current_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<UserSummary>, AppError> {
    let user = state.directory.lookup_user(ctx.user_id).await?;
    Ok(Json(user.summary()))
}

/// Change the caller's name, email or password
pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserSummary>, AppError> {
    let user = state.auth.update_profile(ctx.user_id, body(payload)?).await?;
    Ok(Json(user.summary()))
}

/// Register or replace the caller's push delivery target
pub async fn set_delivery_target(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<DeliveryTargetRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = body(payload)?;
    let target = validation::validate_delivery_target(&request.target)?;
    state.accounts.set_delivery_target(ctx.user_id, target).await?;

    tracing::info!(user_id = ctx.user_id, "delivery target updated");
    Ok(Json(json!({ "message": "delivery target updated" })))
}
