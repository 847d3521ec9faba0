// ============================
// larder-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Stored records have the shape `base64(salt)$base64(key)` where both halves
//! use the standard alphabet without padding. The Argon2id cost parameters are
//! not part of the record; every record is verified with the parameters the
//! process was started with.
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

/// Minimum accepted secret length, in characters
pub const MIN_SECRET_LENGTH: usize = 8;

/// Length of the random salt, in bytes
pub const SALT_LEN: usize = 16;

/// Length of the derived key, in bytes
pub const KEY_LEN: usize = 32;

/// Separates the salt from the key. Never part of the base64 alphabet.
const FIELD_DELIMITER: char = '$';

/// Errors raised while hashing a secret
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("secret must be at least {} characters", MIN_SECRET_LENGTH)]
    InvalidSecret,

    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// Argon2id cost parameters, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashParams {
    /// Number of passes over memory
    pub time_cost: u32,
    /// Memory size in KiB
    pub memory_kib: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl HashParams {
    pub const MIN_TIME_COST: u32 = 3;
    pub const MIN_MEMORY_KIB: u32 = 64 * 1024;
    pub const MIN_PARALLELISM: u32 = 4;

    /// Whether every parameter reaches the production floor
    pub fn meets_minimums(&self) -> bool {
        self.time_cost >= Self::MIN_TIME_COST
            && self.memory_kib >= Self::MIN_MEMORY_KIB
            && self.parallelism >= Self::MIN_PARALLELISM
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            time_cost: Self::MIN_TIME_COST,
            memory_kib: Self::MIN_MEMORY_KIB,
            parallelism: Self::MIN_PARALLELISM,
        }
    }
}

/// Password complexity requirements applied at registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: MIN_SECRET_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

/// Check if a password meets the complexity requirements
pub fn validate_password_strength(password: &str, requirements: &PasswordRequirements) -> bool {
    if password.chars().count() < requirements.min_length {
        return false;
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        return false;
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        return false;
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    if requirements.require_special
        && !password.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace())
    {
        return false;
    }

    true
}

/// Hashes and verifies secrets with a fixed Argon2id configuration
#[derive(Clone)]
pub struct CredentialHasher {
    argon: Argon2<'static>,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let p = self.argon.params();
        f.debug_struct("CredentialHasher")
            .field("t_cost", &p.t_cost())
            .field("m_cost", &p.m_cost())
            .field("p_cost", &p.p_cost())
            .finish()
    }
}

impl CredentialHasher {
    /// Build a hasher for the given cost parameters
    pub fn new(params: HashParams) -> Result<Self, CredentialError> {
        let params = Params::new(
            params.memory_kib,
            params.time_cost,
            params.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| CredentialError::Derivation(e.to_string()))?;

        Ok(Self {
            argon: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a secret into a storable record
    pub fn hash(&self, secret: &str) -> Result<String, CredentialError> {
        if secret.chars().count() < MIN_SECRET_LENGTH {
            return Err(CredentialError::InvalidSecret);
        }

        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let key = self.derive(secret.as_bytes(), &salt)?;

        Ok(format!(
            "{}{}{}",
            STANDARD_NO_PAD.encode(salt),
            FIELD_DELIMITER,
            STANDARD_NO_PAD.encode(key.as_slice())
        ))
    }

    /// Verify a secret against a stored record.
    ///
    /// Malformed records verify as `false`. The key comparison runs in
    /// constant time.
    pub fn verify(&self, secret: &str, stored: &str) -> bool {
        if secret.is_empty() || stored.is_empty() {
            return false;
        }

        let mut fields = stored.split(FIELD_DELIMITER);
        let (Some(salt_b64), Some(key_b64), None) = (fields.next(), fields.next(), fields.next())
        else {
            return false;
        };

        let Ok(salt) = STANDARD_NO_PAD.decode(salt_b64) else {
            return false;
        };
        let Ok(expected) = STANDARD_NO_PAD.decode(key_b64) else {
            return false;
        };

        match self.derive(secret.as_bytes(), &salt) {
            Ok(derived) => bool::from(derived.as_slice().ct_eq(expected.as_slice())),
            Err(_) => false,
        }
    }

    fn derive(&self, secret: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CredentialError> {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        self.argon
            .hash_password_into(secret, salt, &mut key[..])
            .map_err(|e| CredentialError::Derivation(e.to_string()))?;
        Ok(key)
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> HashParams {
    HashParams {
        time_cost: 1,
        memory_kib: 1024,
        parallelism: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(test_params()).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let record = hasher.hash("correct horse battery").unwrap();

        assert!(hasher.verify("correct horse battery", &record));
        assert!(!hasher.verify("correct horse battery!", &record));
    }

    #[test]
    fn test_same_secret_gets_fresh_salt() {
        let hasher = hasher();
        let a = hasher.hash("Str0ng!secret").unwrap();
        let b = hasher.hash("Str0ng!secret").unwrap();

        assert_ne!(a, b);
        assert!(hasher.verify("Str0ng!secret", &a));
        assert!(hasher.verify("Str0ng!secret", &b));
    }

    #[test]
    fn test_record_layout() {
        let record = hasher().hash("abcdefgh").unwrap();
        let (salt, key) = record.split_once('$').unwrap();

        assert_eq!(STANDARD_NO_PAD.decode(salt).unwrap().len(), SALT_LEN);
        assert_eq!(STANDARD_NO_PAD.decode(key).unwrap().len(), KEY_LEN);
        assert!(!record.contains('='));
    }

    #[test]
    fn test_rejects_short_secret() {
        let hasher = hasher();
        assert!(matches!(hasher.hash(""), Err(CredentialError::InvalidSecret)));
        assert!(matches!(hasher.hash("1234567"), Err(CredentialError::InvalidSecret)));
        assert!(hasher.hash("12345678").is_ok());
    }

    #[test]
    fn test_malformed_records_fail_closed() {
        let hasher = hasher();
        let good = hasher.hash("abcdefgh").unwrap();
        let (salt, key) = good.split_once('$').unwrap();

        assert!(!hasher.verify("abcdefgh", ""));
        assert!(!hasher.verify("", &good));
        assert!(!hasher.verify("abcdefgh", salt));
        assert!(!hasher.verify("abcdefgh", &format!("{good}$extra")));
        assert!(!hasher.verify("abcdefgh", &format!("{salt}$!!notbase64!!")));
        assert!(!hasher.verify("abcdefgh", &format!("***${key}")));
        // argon2 refuses salts shorter than 8 bytes
        assert!(!hasher.verify("abcdefgh", &format!("{}${key}", STANDARD_NO_PAD.encode([1u8; 4]))));
    }

    #[test]
    fn test_truncated_key_does_not_verify() {
        let hasher = hasher();
        let good = hasher.hash("abcdefgh").unwrap();
        let (salt, key) = good.split_once('$').unwrap();
        let mut raw = STANDARD_NO_PAD.decode(key).unwrap();
        raw.truncate(16);

        let truncated = format!("{salt}${}", STANDARD_NO_PAD.encode(raw));
        assert!(!hasher.verify("abcdefgh", &truncated));
    }

    #[test]
    fn test_default_params_round_trip() {
        let hasher = CredentialHasher::new(HashParams::default()).unwrap();
        let record = hasher.hash("Default-Params-1").unwrap();
        assert!(hasher.verify("Default-Params-1", &record));
    }

    #[test]
    fn test_default_params_meet_minimums() {
        assert!(HashParams::default().meets_minimums());
        assert!(!test_params().meets_minimums());
    }

    #[test]
    fn test_password_strength_validation() {
        let requirements = PasswordRequirements::default();

        assert!(validate_password_strength("SecureP@ss1", &requirements));
        // Too short
        assert!(!validate_password_strength("Sh0rt!", &requirements));
        // Missing uppercase
        assert!(!validate_password_strength("securep@ss1", &requirements));
        // Missing lowercase
        assert!(!validate_password_strength("SECUREP@SS1", &requirements));
        // Missing digit
        assert!(!validate_password_strength("SecureP@ss", &requirements));
        // Missing special character
        assert!(!validate_password_strength("SecurePass1", &requirements));

        let relaxed = PasswordRequirements {
            min_length: 8,
            require_uppercase: false,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
        };
        assert!(validate_password_strength("securepass1", &relaxed));
    }
}
