// ============================
// crates/backend-lib/src/notify.rs
// ============================
//! Notification delivery.
//!
//! The scheduler and the admin handler share one [`Notifier`]. The transport
//! behind it is opaque: it receives a recipient token and the rendered
//! [`Notification`].
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use larder_common::{GroceryItem, Notification, UserId};
use serde::Serialize;
use thiserror::Error;

use crate::error::AppError;
use crate::storage::{StorageError, UserDirectory};

/// Title used for ad-hoc messages sent by an administrator
pub const MESSAGE_TITLE: &str = "Grocery Notification";

/// Value of the `type` data field on expiry alerts
pub const EXPIRY_ALERT: &str = "expiry_alert";

/// Characters of the delivery target kept in logs
const TARGET_LOG_PREFIX: usize = 8;

/// Errors raised by a notification sink
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("delivery timed out")]
    Timeout,
}

/// Outbound sink for push notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn dispatch(&self, target: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// Sink that records deliveries as log events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn dispatch(&self, target: &str, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            target_prefix = %redact_target(target),
            title = %notification.title,
            body = %notification.body,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Shorten a delivery target for logging
pub fn redact_target(target: &str) -> String {
    let prefix: String = target.chars().take(TARGET_LOG_PREFIX).collect();
    if prefix.len() < target.len() {
        format!("{prefix}…")
    } else {
        prefix
    }
}

#[derive(Serialize)]
struct ItemDetail<'a> {
    name: &'a str,
    expiry_date: DateTime<Utc>,
}

/// Build the expiry alert for one user's qualifying items.
///
/// Items are ordered by expiry; the title counts whole days until the
/// soonest one. Returns `None` for an empty slice.
pub fn expiry_notification(items: &[GroceryItem], now: DateTime<Utc>) -> Option<Notification> {
    let mut items: Vec<&GroceryItem> = items.iter().collect();
    items.sort_by_key(|item| item.expiry_date);
    let soonest = items.first()?;

    let count = items.len();
    let days = (soonest.expiry_date - now).num_days().max(0);
    let title = format!(
        "{count} {} expiring in {days} {}",
        plural(count as i64, "item"),
        plural(days, "day")
    );

    let body = if count == 1 {
        format!(
            "{} is expiring on {}",
            soonest.name,
            soonest.expiry_date.format("%b %-d")
        )
    } else {
        let names: Vec<&str> = items.iter().map(|item| item.name.as_str()).collect();
        format!("Items: {}", join_with_and(&names))
    };

    let details: Vec<ItemDetail<'_>> = items
        .iter()
        .map(|item| ItemDetail {
            name: &item.name,
            expiry_date: item.expiry_date,
        })
        .collect();
    let details = serde_json::to_string(&details).unwrap_or_else(|_| "[]".to_string());

    let mut data = BTreeMap::new();
    data.insert("type".to_string(), EXPIRY_ALERT.to_string());
    data.insert("count".to_string(), count.to_string());
    data.insert("details".to_string(), details);

    Some(Notification { title, body, data })
}

fn plural(n: i64, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// `a`, `a and b`, `a, b and c`
fn join_with_and(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => only.to_string(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Send an administrator's message to one user
pub async fn send_message(
    directory: &dyn UserDirectory,
    notifier: &dyn Notifier,
    user_id: UserId,
    message: &str,
) -> Result<(), AppError> {
    let user = directory.lookup_user(user_id).await.map_err(|e| match e {
        StorageError::UserNotFound(id) => AppError::NotFound(format!("user {id}")),
        other => AppError::from(other),
    })?;

    let Some(target) = user.delivery_target.as_deref() else {
        return Err(AppError::InvalidInput(format!(
            "user {user_id} has no registered delivery target"
        )));
    };

    let notification = Notification {
        title: MESSAGE_TITLE.to_string(),
        body: message.to_string(),
        data: BTreeMap::new(),
    };
    notifier.dispatch(target, &notification).await?;

    tracing::info!(user_id, "admin notification sent");
    Ok(())
}
