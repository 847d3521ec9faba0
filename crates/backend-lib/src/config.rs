// ============================
// larder-backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Sources are layered with figment: built-in defaults, then the TOML file,
//! then `LARDER_` environment variables (`__` separates nested keys).
use std::net::SocketAddr;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{HashParams, PasswordRequirements, SecretError, SigningSecret, MIN_SECRET_LENGTH};
use crate::scheduler::{ScanSettings, MAX_LOOKAHEAD_SECS};
use crate::validation;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "LARDER_";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration failures. All of them are fatal at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid log level '{0}', expected one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid signing secret: {0}")]
    Secret(#[from] SecretError),

    #[error("hashing parameters below minimum (time_cost >= {}, memory_kib >= {}, parallelism >= {})",
        HashParams::MIN_TIME_COST, HashParams::MIN_MEMORY_KIB, HashParams::MIN_PARALLELISM)]
    WeakHashParams,

    #[error("password min_length {0} is below the minimum")]
    PasswordPolicy(usize),

    #[error("scan.thresholds must not be empty")]
    NoThresholds,

    #[error("invalid admin email '{0}'")]
    InvalidAdminEmail(String),

    #[error(
        "scan threshold needs a positive interval and a lookahead of 1..={max}s (lookahead {lookahead_secs}s, interval {interval_secs}s)",
        max = MAX_LOOKAHEAD_SECS
    )]
    InvalidThreshold {
        lookahead_secs: u64,
        interval_secs: u64,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable single-line output
    #[default]
    Full,
    /// One JSON object per event
    Json,
}

/// Raw signing secret as read from configuration, redacted in `Debug`
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSecret(String);

impl RawSecret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl std::fmt::Debug for RawSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RawSecret([REDACTED])")
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    pub log_format: LogFormat,
    /// HS256 key for session tokens
    pub signing_secret: RawSecret,
    /// Argon2id cost parameters
    pub hashing: HashParams,
    /// Password requirements
    pub password_requirements: PasswordRequirements,
    pub scan: ScanSettings,
    /// Accounts registered with one of these emails get the admin role
    pub admin_emails: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            signing_secret: RawSecret::default(),
            hashing: HashParams::default(),
            password_requirements: PasswordRequirements::default(),
            scan: ScanSettings::default(),
            admin_emails: Vec::new(),
        }
    }
}

impl Settings {
    /// Layer defaults, the TOML file at `path` (if present) and the environment
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings from every source
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Check every setting and return the validated signing secret
    pub fn validate(&self) -> Result<SigningSecret, ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log_level.clone()));
        }

        if !self.hashing.meets_minimums() {
            return Err(ConfigError::WeakHashParams);
        }

        if self.password_requirements.min_length < MIN_SECRET_LENGTH {
            return Err(ConfigError::PasswordPolicy(
                self.password_requirements.min_length,
            ));
        }

        if self.scan.thresholds.is_empty() {
            return Err(ConfigError::NoThresholds);
        }
        if let Some(bad) = self
            .scan
            .thresholds
            .iter()
            .find(|t| !t.is_usable())
        {
            return Err(ConfigError::InvalidThreshold {
                lookahead_secs: bad.lookahead_secs,
                interval_secs: bad.interval_secs,
            });
        }

        if let Some(bad) = self
            .admin_emails
            .iter()
            .find(|e| validation::validate_email(&validation::normalize_email(e)).is_err())
        {
            return Err(ConfigError::InvalidAdminEmail(bad.clone()));
        }

        Ok(SigningSecret::new(&self.signing_secret.0)?)
    }

    /// Normalized admin emails
    pub fn admin_emails(&self) -> Vec<String> {
        self.admin_emails
            .iter()
            .map(|e| validation::normalize_email(e))
            .collect()
    }
}
