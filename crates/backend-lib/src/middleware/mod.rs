// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the Larder API.

pub mod auth;

pub use auth::{require_admin, require_auth};
