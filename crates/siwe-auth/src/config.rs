//! Authentication configuration with validation.
//!
//! Loaded from defaults, a TOML file, or `SIWE_*` environment variables.
//!
//! ```toml
//! nonce_ttl_secs = 300
//! gc_interval_secs = 30
//! max_outstanding_nonces = 100000
//! resolver_timeout_ms = 5000
//! attempt_deadline_ms = 10000
//! max_message_bytes = 16384
//! expected_domain = "example.org"
//! ```

use crate::domain::message::DEFAULT_MAX_MESSAGE_BYTES;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Longest nonce lifetime or purge spacing accepted (one day).
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Errors that can occur during config loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Authentication service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of an issued nonce
    pub nonce_ttl_secs: u64,
    /// Minimum spacing between lazy purges of expired nonces
    pub gc_interval_secs: u64,
    /// Bound on live nonces held by the in-memory store (None = unbounded)
    pub max_outstanding_nonces: Option<usize>,
    /// Budget for one contract-account resolution call
    pub resolver_timeout_ms: u64,
    /// Budget for one attempt, up to and including signature verification
    pub attempt_deadline_ms: u64,
    /// Largest raw message accepted by the parser
    pub max_message_bytes: usize,
    /// When set, claims for any other domain are rejected
    pub expected_domain: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            nonce_ttl_secs: 300,
            gc_interval_secs: 30,
            max_outstanding_nonces: None,
            resolver_timeout_ms: 5_000,
            attempt_deadline_ms: 10_000,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            expected_domain: None,
        }
    }
}

impl AuthConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SIWE_NONCE_TTL_SECS`
    /// - `SIWE_GC_INTERVAL_SECS`
    /// - `SIWE_MAX_OUTSTANDING_NONCES`
    /// - `SIWE_RESOLVER_TIMEOUT_MS`
    /// - `SIWE_ATTEMPT_DEADLINE_MS`
    /// - `SIWE_MAX_MESSAGE_BYTES`
    /// - `SIWE_EXPECTED_DOMAIN`
    ///
    /// Unset variables keep their defaults; unparseable ones are an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            nonce_ttl_secs: env_or("SIWE_NONCE_TTL_SECS", "nonce_ttl_secs", defaults.nonce_ttl_secs)?,
            gc_interval_secs: env_or(
                "SIWE_GC_INTERVAL_SECS",
                "gc_interval_secs",
                defaults.gc_interval_secs,
            )?,
            max_outstanding_nonces: match env::var("SIWE_MAX_OUTSTANDING_NONCES") {
                Ok(v) => Some(parse_field(&v, "max_outstanding_nonces")?),
                Err(_) => defaults.max_outstanding_nonces,
            },
            resolver_timeout_ms: env_or(
                "SIWE_RESOLVER_TIMEOUT_MS",
                "resolver_timeout_ms",
                defaults.resolver_timeout_ms,
            )?,
            attempt_deadline_ms: env_or(
                "SIWE_ATTEMPT_DEADLINE_MS",
                "attempt_deadline_ms",
                defaults.attempt_deadline_ms,
            )?,
            max_message_bytes: env_or(
                "SIWE_MAX_MESSAGE_BYTES",
                "max_message_bytes",
                defaults.max_message_bytes,
            )?,
            expected_domain: env::var("SIWE_EXPECTED_DOMAIN")
                .ok()
                .filter(|v| !v.is_empty())
                .or(defaults.expected_domain),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nonce_ttl_secs == 0 {
            return Err(invalid("nonce_ttl_secs", "cannot be 0"));
        }

        if self.nonce_ttl_secs > MAX_INTERVAL_SECS {
            return Err(invalid(
                "nonce_ttl_secs",
                &format!("cannot exceed {MAX_INTERVAL_SECS}"),
            ));
        }

        if self.gc_interval_secs > MAX_INTERVAL_SECS {
            return Err(invalid(
                "gc_interval_secs",
                &format!("cannot exceed {MAX_INTERVAL_SECS}"),
            ));
        }

        if self.resolver_timeout_ms == 0 {
            return Err(invalid("resolver_timeout_ms", "cannot be 0"));
        }

        if self.attempt_deadline_ms == 0 {
            return Err(invalid("attempt_deadline_ms", "cannot be 0"));
        }

        if self.resolver_timeout_ms > self.attempt_deadline_ms {
            return Err(invalid(
                "resolver_timeout_ms",
                "cannot exceed attempt_deadline_ms",
            ));
        }

        if self.max_message_bytes == 0 {
            return Err(invalid("max_message_bytes", "cannot be 0"));
        }

        if self.max_outstanding_nonces == Some(0) {
            return Err(invalid("max_outstanding_nonces", "cannot be 0"));
        }

        Ok(())
    }

    /// Nonce lifetime, clamped to [`MAX_INTERVAL_SECS`] for unvalidated configs.
    pub fn nonce_ttl(&self) -> chrono::Duration {
        clamped_seconds(self.nonce_ttl_secs)
    }

    pub fn gc_interval(&self) -> chrono::Duration {
        clamped_seconds(self.gc_interval_secs)
    }

    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }

    pub fn attempt_deadline(&self) -> Duration {
        Duration::from_millis(self.attempt_deadline_ms)
    }
}

fn clamped_seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::try_seconds(secs.min(MAX_INTERVAL_SECS) as i64)
        .unwrap_or_else(chrono::Duration::zero)
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

fn parse_field<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(field, &format!("{value:?} is not a number")))
}

fn env_or<T: std::str::FromStr>(
    var: &str,
    field: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(v) => parse_field(&v, field),
        Err(_) => Ok(default),
    }
}
