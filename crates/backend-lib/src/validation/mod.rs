// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for account, inventory and notification requests.

use chrono::{DateTime, Utc};
use larder_common::NewGroceryItem;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_TARGET_LENGTH: usize = 4096;
const MAX_MESSAGE_LENGTH: usize = 1000;
const MAX_UNIT_LENGTH: usize = 32;
const MAX_EXPIRING_DAYS: u32 = 365;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid delivery target: {0}")]
    InvalidTarget(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an already normalized email address
pub fn validate_email(email: &str) -> ValidationResult<()> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail("email is required".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "email exceeds {MAX_EMAIL_LENGTH} characters"
        )));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail("malformed address".to_string()));
    }
    Ok(())
}

/// Trim a display name and check its length
pub fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidName("name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Trim a push registration token and check it is usable
pub fn validate_delivery_target(target: &str) -> ValidationResult<String> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ValidationError::InvalidTarget("target is required".to_string()));
    }
    if target.len() > MAX_TARGET_LENGTH {
        return Err(ValidationError::InvalidTarget("target is too long".to_string()));
    }
    if target.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidTarget(
            "target must not contain whitespace".to_string(),
        ));
    }
    Ok(target.to_string())
}

/// Validate the free text of an ad-hoc notification
pub fn validate_message(message: &str) -> ValidationResult<String> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ValidationError::InvalidMessage("message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(ValidationError::InvalidMessage(format!(
            "message exceeds {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(message.to_string())
}

/// Trim and check a new inventory item. Items that already expired are refused.
pub fn validate_grocery_item(item: NewGroceryItem, now: DateTime<Utc>) -> ValidationResult<NewGroceryItem> {
    let name = validate_name(&item.name)
        .map_err(|_| ValidationError::InvalidItem("name must be 1 to 100 characters".to_string()))?;
    if !item.quantity.is_finite() || item.quantity <= 0.0 {
        return Err(ValidationError::InvalidItem("quantity must be positive".to_string()));
    }
    let unit = item.unit.trim().to_string();
    if unit.chars().count() > MAX_UNIT_LENGTH {
        return Err(ValidationError::InvalidItem(format!(
            "unit exceeds {MAX_UNIT_LENGTH} characters"
        )));
    }
    if item.expiry_date < now {
        return Err(ValidationError::InvalidItem("expiry date is in the past".to_string()));
    }
    Ok(NewGroceryItem { name, unit, ..item })
}

/// Check the size in days of an expiring-items window
pub fn validate_expiring_days(days: u32) -> ValidationResult<u32> {
    if days == 0 || days > MAX_EXPIRING_DAYS {
        return Err(ValidationError::InvalidWindow(format!(
            "days must be between 1 and {MAX_EXPIRING_DAYS}"
        )));
    }
    Ok(days)
}
