//! Environment-driven configuration.
//!
//! All settings come from `CAKEWALK_*` environment variables; the three
//! identity-provider settings are required, everything else has a default.
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `CAKEWALK_BIND_ADDR` | Listen address | `0.0.0.0:8080` |
//! | `CAKEWALK_KEY_SET_URL` | Identity provider key-set endpoint | required |
//! | `CAKEWALK_ISSUER` | Trusted token issuer | required |
//! | `CAKEWALK_AUDIENCE` | Expected token audience | required |
//! | `CAKEWALK_CLOCK_SKEW_SECS` | Claim-window skew tolerance | `5` |
//! | `CAKEWALK_KEY_TTL_SECS` | Key cache staleness bound | `300` |

use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;
use url::Url;

/// Default listen address.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default claim-window skew tolerance (seconds).
const DEFAULT_CLOCK_SKEW_SECS: u64 = 5;

/// Default key cache staleness bound (seconds).
const DEFAULT_KEY_TTL_SECS: u64 = 300;

/// Process configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Identity provider key-set endpoint.
    pub key_set_url: Url,
    /// Trusted token issuer.
    pub issuer: String,
    /// Expected token audience.
    pub audience: String,
    /// Claim-window skew tolerance.
    pub clock_skew: Duration,
    /// Key cache staleness bound.
    pub key_ttl: Duration,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// A variable is set but unparseable.
    #[error("invalid value for {name}: {detail}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Why the value was rejected.
        detail: String,
    },
}

impl ApiConfig {
    /// Loads configuration from `CAKEWALK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or any
    /// value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("CAKEWALK_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: "CAKEWALK_BIND_ADDR",
                detail: format!("{e}"),
            })?;

        let key_set_url = require("CAKEWALK_KEY_SET_URL")?
            .parse()
            .map_err(|e| ConfigError::Invalid {
                name: "CAKEWALK_KEY_SET_URL",
                detail: format!("{e}"),
            })?;

        let issuer = require("CAKEWALK_ISSUER")?;
        let audience = require("CAKEWALK_AUDIENCE")?;

        let clock_skew =
            Duration::from_secs(secs_or("CAKEWALK_CLOCK_SKEW_SECS", DEFAULT_CLOCK_SKEW_SECS)?);
        let key_ttl = Duration::from_secs(secs_or("CAKEWALK_KEY_TTL_SECS", DEFAULT_KEY_TTL_SECS)?);

        Ok(Self { bind_addr, key_set_url, issuer, audience, clock_skew, key_ttl })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn secs_or(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value
            .parse()
            .map_err(|e| ConfigError::Invalid { name, detail: format!("{e}") }),
    }
}
