// ============================
// crates/backend-lib/src/handlers/grocery.rs
// ============================
//! Inventory handlers. Every route works on the caller's own items.
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use larder_common::{ExpiringQuery, GroceryItem, NewGroceryItem};

use super::body;
use crate::auth::AuthContext;
use crate::error::AppError;
use crate::validation;
use crate::AppState;

pub async fn list_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<Vec<GroceryItem>>, AppError> {
    Ok(Json(state.pantry.list_items(ctx.user_id).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    payload: Result<Json<NewGroceryItem>, JsonRejection>,
) -> Result<(StatusCode, Json<GroceryItem>), AppError> {
    let item = validation::validate_grocery_item(body(payload)?, Utc::now())?;
    let item = state.pantry.insert_item(ctx.user_id, item).await?;

    tracing::debug!(user_id = ctx.user_id, item_id = item.id, "item added");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Items expiring between now and `days` from now, soonest first
pub async fn expiring_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    query: Result<Query<ExpiringQuery>, QueryRejection>,
) -> Result<Json<Vec<GroceryItem>>, AppError> {
    let Query(query) = query.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let days = validation::validate_expiring_days(query.days)?;

    let now = Utc::now();
    let end = now + Duration::days(i64::from(days));
    let mut items = state.pantry.expiring_items(ctx.user_id, now, end).await?;
    items.sort_by_key(|item| (item.expiry_date, item.id));
    Ok(Json(items))
}
