// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Bearer token issuance and validation.
//!
//! Tokens are HS256 JWTs carrying only `sub`, `iat` and `exp`. Nothing is kept
//! server side; a token is valid exactly when its MAC verifies and it has not
//! expired.
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use larder_common::UserId;
use serde::{Deserialize, Serialize};

use super::{AuthError, SigningSecret};

/// Token lifetime (7 days)
pub const TOKEN_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// The only algorithm this service signs with or accepts
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in every session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the decimal user id
    pub sub: String,
    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expires at (Unix timestamp, seconds)
    pub exp: i64,
}

/// Issues and validates session tokens
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &SigningSecret) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.expose()),
            decoding: DecodingKey::from_secret(secret.expose()),
            validation,
        }
    }

    /// Issue a token for `user_id`, valid from now
    pub fn issue(&self, user_id: UserId) -> anyhow::Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(&self, user_id: UserId, issued_at: DateTime<Utc>) -> anyhow::Result<String> {
        let ttl = chrono::Duration::from_std(TOKEN_TTL).context("token ttl out of range")?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .context("failed to sign session token")?;
        metrics::counter!(crate::metrics::TOKEN_ISSUED).increment(1);
        Ok(token)
    }

    /// Validate a token and return its subject
    pub fn validate(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                // A header naming any other algorithm is treated as a forgery
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
                _ => AuthError::MalformedToken,
            }
        })?;

        data.claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::MalformedToken)
    }
}
