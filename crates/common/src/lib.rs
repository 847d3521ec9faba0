// ================
// common/src/lib.rs
// ================
//! Common types shared between the Larder backend and its clients.
//! This module defines the inventory records, notification payloads and the
//! JSON bodies exchanged over the HTTP API.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric identifier of a user account
pub type UserId = u64;

/// Numeric identifier of a grocery item
pub type ItemId = u64;

/// Where a grocery item is kept
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StorageLocation {
    DeepFreeze,
    Refrigerator,
    DryPantry,
}

/// A single item in a household inventory
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroceryItem {
    pub id: ItemId,
    /// Owner of the item
    pub user_id: UserId,
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    /// Moment after which the item should no longer be used
    pub expiry_date: DateTime<Utc>,
    pub storage_location: StorageLocation,
}

/// Content handed to a notification sink
///
/// # Fields
/// * `title` - Short headline shown by the device
/// * `body` - Longer human readable text
/// * `data` - Machine readable key/value payload
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Notification {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

/// Body of `POST /api/auth/register`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user account. Never carries the credential record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    /// Whether a push delivery target has been registered
    pub has_delivery_target: bool,
}

/// Response to a successful login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    /// Bearer token to present in the `Authorization` header
    pub token: String,
    pub user: UserSummary,
}

/// Body of `POST /api/user/delivery-target`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DeliveryTargetRequest {
    /// Device registration token issued by the push provider
    pub target: String,
}

/// Body of `POST /api/admin/send-notification`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SendNotificationRequest {
    pub user_id: UserId,
    pub message: String,
}

/// Response of `GET /api/auth/isadmin`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminStatus {
    pub is_admin: bool,
}

/// Body of `POST /api/groceries`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewGroceryItem {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    pub expiry_date: DateTime<Utc>,
    pub storage_location: StorageLocation,
}

fn default_quantity() -> f64 {
    1.0
}

/// Query of `GET /api/groceries/expiring`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiringQuery {
    /// Size of the window in days, starting now
    #[serde(default = "default_expiring_days")]
    pub days: u32,
}

fn default_expiring_days() -> u32 {
    7
}

impl Default for ExpiringQuery {
    fn default() -> Self {
        Self {
            days: default_expiring_days(),
        }
    }
}

/// Body of `PUT /api/user`. Absent or blank fields are left unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}
