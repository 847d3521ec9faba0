// ============================
// larder-backend-lib/src/lib.rs
// ============================
//! Core library for the Larder backend: credentials, session tokens,
//! request authorization and the expiry scan scheduler.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod notify;
pub mod router;
pub mod scheduler;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, CredentialError, CredentialHasher, DefaultAuth, SigningSecret, TokenService};
use crate::config::Settings;
use crate::notify::Notifier;
use crate::storage::{AccountStore, PantryStore, UserDirectory};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings the process started with
    pub settings: Arc<Settings>,
    /// Session token issuer and validator
    pub tokens: Arc<TokenService>,
    /// Registration and login
    pub auth: Arc<dyn AuthService>,
    /// Account reads and writes
    pub accounts: Arc<dyn AccountStore>,
    /// Identity lookups for the authorization pipeline
    pub directory: Arc<dyn UserDirectory>,
    /// Grocery inventory
    pub pantry: Arc<dyn PantryStore>,
    /// Outbound notifications
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Create a new application state around one storage backend
    pub fn new<S>(
        storage: Arc<S>,
        settings: Settings,
        secret: &SigningSecret,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CredentialError>
    where
        S: AccountStore + PantryStore + 'static,
    {
        let hasher = Arc::new(CredentialHasher::new(settings.hashing)?);
        let tokens = Arc::new(TokenService::new(secret));
        let auth = Arc::new(DefaultAuth::new(
            hasher,
            tokens.clone(),
            storage.clone(),
            settings.password_requirements.clone(),
            settings.admin_emails(),
        )?);

        Ok(Self {
            settings: Arc::new(settings),
            tokens,
            auth,
            accounts: storage.clone(),
            directory: storage.clone(),
            pantry: storage,
            notifier,
        })
    }
}
