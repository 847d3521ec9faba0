// ============================
// larder-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod errors;
pub mod password;
pub mod pipeline;
pub mod secret;
pub mod token;
mod service;
mod service_impl;

pub use errors::{AuthCategory, AuthError};
pub use password::{
    validate_password_strength, CredentialError, CredentialHasher, HashParams,
    PasswordRequirements, MIN_SECRET_LENGTH,
};
pub use pipeline::{authorize, bearer_token, AuthContext};
pub use secret::{generate_secret, SecretError, SigningSecret};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use token::{TokenService, TOKEN_TTL};
