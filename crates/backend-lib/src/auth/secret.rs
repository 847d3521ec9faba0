// ============================
// crates/backend-lib/src/auth/secret.rs
// ============================
//! Token signing secret.
//!
//! The secret is validated once at startup and handed by reference to the
//! token service. It is wiped from memory when dropped.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum secret size in bytes (256 bits)
pub const MIN_SECRET_BYTES: usize = 32;

/// Placeholder values that ship in sample configs and must never sign tokens
const KNOWN_PLACEHOLDERS: &[&str] = &[
    "your_jwt_secret_key",
    "changeme",
    "change-me",
    "secret",
    "default",
    "development",
];

/// Reasons a signing secret is refused
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SecretError {
    #[error("signing secret is empty")]
    Empty,

    #[error("signing secret is too short ({0} bytes)")]
    TooShort(usize),

    #[error("signing secret is a well-known placeholder")]
    Placeholder,

    #[error("signing secret has no entropy (single repeated byte)")]
    Degenerate,
}

/// Validated symmetric key used to sign session tokens
pub struct SigningSecret(Zeroizing<Vec<u8>>);

impl SigningSecret {
    /// Validate a raw secret
    pub fn new(raw: &str) -> Result<Self, SecretError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SecretError::Empty);
        }

        let lowered = trimmed.to_ascii_lowercase();
        if KNOWN_PLACEHOLDERS.contains(&lowered.as_str()) {
            return Err(SecretError::Placeholder);
        }

        if trimmed.len() < MIN_SECRET_BYTES {
            return Err(SecretError::TooShort(trimmed.len()));
        }

        let first = trimmed.as_bytes()[0];
        if trimmed.bytes().all(|b| b == first) {
            return Err(SecretError::Degenerate);
        }

        Ok(Self(Zeroizing::new(trimmed.as_bytes().to_vec())))
    }

    /// Raw key bytes
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

/** Generate a fresh random signing secret
This uses OS-provided entropy and returns a base64 URL-safe string
without padding, suitable for the `signing_secret` setting. */
pub fn generate_secret() -> String {
    let mut buffer = Zeroizing::new(vec![0u8; MIN_SECRET_BYTES * 2]);
    OsRng.fill_bytes(&mut buffer);
    URL_SAFE_NO_PAD.encode(buffer.as_slice())
}
