// ============================
// crates/backend-lib/src/auth/service_impl.rs
// ============================
use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use larder_common::{RegisterRequest, UpdateUserRequest, UserId};
use zeroize::Zeroizing;

use super::{
    generate_secret, validate_password_strength, AuthService, CredentialError, CredentialHasher,
    PasswordRequirements, TokenService,
};
use crate::error::AppError;
use crate::storage::{AccountStore, NewUser, StorageError, UserRecord, UserUpdate};
use crate::validation;

pub struct DefaultAuth {
    hasher: Arc<CredentialHasher>,
    tokens: Arc<TokenService>,
    accounts: Arc<dyn AccountStore>,
    requirements: PasswordRequirements,
    /// Normalized emails that register as admins
    admin_emails: HashSet<String>,
    /// Verified against when the email is unknown, so both paths cost one derivation
    decoy_record: String,
}

impl DefaultAuth {
    pub fn new(
        hasher: Arc<CredentialHasher>,
        tokens: Arc<TokenService>,
        accounts: Arc<dyn AccountStore>,
        requirements: PasswordRequirements,
        admin_emails: impl IntoIterator<Item = String>,
    ) -> Result<Self, CredentialError> {
        let decoy_record = hasher.hash(&generate_secret())?;
        Ok(Self {
            hasher,
            tokens,
            accounts,
            requirements,
            admin_emails: admin_emails.into_iter().collect(),
            decoy_record,
        })
    }

    fn check_strength(&self, password: &str) -> Result<(), AppError> {
        if validate_password_strength(password, &self.requirements) {
            return Ok(());
        }
        Err(AppError::InvalidInput(format!(
            "password must be at least {} characters and satisfy the complexity policy",
            self.requirements.min_length
        )))
    }

    async fn hash_off_runtime(&self, password: Zeroizing<String>) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
            .map_err(AppError::from)
    }

    async fn verify_off_runtime(&self, password: Zeroizing<String>, record: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &record))
            .await
            .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn register(&self, request: RegisterRequest) -> Result<UserRecord, AppError> {
        let password = Zeroizing::new(request.password.trim().to_string());
        let email = validation::normalize_email(&request.email);
        validation::validate_email(&email)?;
        let name = validation::validate_name(&request.name)?;
        self.check_strength(&password)?;

        let password_hash = self.hash_off_runtime(password).await?;
        let is_admin = self.admin_emails.contains(&email);

        let user = self
            .accounts
            .create_user(NewUser {
                name,
                email,
                password_hash,
                is_admin,
            })
            .await
            .map_err(email_conflict)?;

        metrics::counter!(crate::metrics::USER_REGISTERED).increment(1);
        tracing::info!(user_id = user.id, is_admin, "user registered");
        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<(String, UserRecord), AppError> {
        let email = validation::normalize_email(email);
        let password = Zeroizing::new(password.trim().to_string());

        let Some(user) = self.accounts.find_by_email(&email).await? else {
            let _ = self
                .verify_off_runtime(password, self.decoy_record.clone())
                .await?;
            tracing::debug!("login for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .verify_off_runtime(password, user.password_hash.clone())
            .await?
        {
            tracing::debug!(user_id = user.id, "password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .tokens
            .issue(user.id)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        tracing::info!(user_id = user.id, "login succeeded");
        Ok((token, user))
    }

    async fn update_profile(&self, user_id: UserId, request: UpdateUserRequest) -> Result<UserRecord, AppError> {
        let name = non_blank(request.name)
            .map(|name| validation::validate_name(&name))
            .transpose()?;

        let email = match non_blank(request.email) {
            Some(raw) => {
                let email = validation::normalize_email(&raw);
                validation::validate_email(&email)?;
                Some(email)
            },
            None => None,
        };

        let password_hash = match non_blank(request.password) {
            Some(raw) => {
                let password = Zeroizing::new(raw.trim().to_string());
                self.check_strength(&password)?;
                Some(self.hash_off_runtime(password).await?)
            },
            None => None,
        };
        let password_changed = password_hash.is_some();

        let user = self
            .accounts
            .update_user(
                user_id,
                UserUpdate {
                    name,
                    email,
                    password_hash,
                },
            )
            .await
            .map_err(email_conflict)?;

        tracing::info!(user_id, password_changed, "profile updated");
        Ok(user)
    }
}

fn email_conflict(err: StorageError) -> AppError {
    match err {
        StorageError::EmailTaken => AppError::Conflict("email already registered".into()),
        other => AppError::from(other),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
