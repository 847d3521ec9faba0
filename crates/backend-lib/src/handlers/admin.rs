// ============================
// crates/backend-lib/src/handlers/admin.rs
// ============================
//! Admin-only handlers. Routes are gated by `require_admin`.
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use larder_common::{SendNotificationRequest, UserSummary};
use serde_json::{json, Value};

use super::body;
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::notify;
use crate::validation;
use crate::AppState;

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserSummary>>, AppError> {
    let users = state.accounts.list_users().await?;
    Ok(Json(users.iter().map(|u| u.summary()).collect()))
}

pub async fn send_notification(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let request = body(payload)?;
    let message = validation::validate_message(&request.message)?;

    notify::send_message(
        state.directory.as_ref(),
        state.notifier.as_ref(),
        request.user_id,
        &message,
    )
    .await?;

    tracing::info!(admin_id = ctx.user_id, user_id = request.user_id, "notification sent by admin");
    Ok(Json(json!({ "message": "notification sent" })))
}
