// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.
use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Value};

use crate::error::AppError;

pub mod admin;
pub mod auth;
pub mod grocery;
pub mod user;

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Turn a body rejection into the common error shape
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::InvalidInput(e.body_text()))
}
