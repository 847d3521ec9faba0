// ============================
// crates/backend-lib/src/auth/service.rs
// ============================
use async_trait::async_trait;
use larder_common::{RegisterRequest, UpdateUserRequest, UserId};

use crate::error::AppError;
use crate::storage::UserRecord;

/// Account registration and login
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Validate, hash and store a new account
    async fn register(&self, request: RegisterRequest) -> Result<UserRecord, AppError>;

    /// Check credentials and issue a session token
    async fn login(&self, email: &str, password: &str) -> Result<(String, UserRecord), AppError>;

    /// Change profile fields. A new password replaces the credential record
    /// wholesale.
    async fn update_profile(&self, user_id: UserId, request: UpdateUserRequest) -> Result<UserRecord, AppError>;
}
