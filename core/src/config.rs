//! Client configuration and endpoint validation.
//!
//! # Design
//! `ClientConfig` is plain data. It can be built in code, deserialized from a
//! host's config file (timeouts as whole milliseconds), or read from the
//! environment. None of these validate; `validate` runs when the config is
//! handed to `Client::configure`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(120);

pub const ENV_ENDPOINT: &str = "TSDB_ENDPOINT";
pub const ENV_DIAL_TIMEOUT_MS: &str = "TSDB_DIAL_TIMEOUT_MS";
pub const ENV_RESPONSE_TIMEOUT_MS: &str = "TSDB_RESPONSE_TIMEOUT_MS";

/// Endpoint and timeout settings for a `Client`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://tsdb.example.com`. No trailing slash.
    pub endpoint: String,

    /// Upper bound on establishing a TCP connection.
    #[serde(
        rename = "dial_timeout_ms",
        with = "millis",
        default = "default_dial_timeout"
    )]
    pub dial_timeout: Duration,

    /// Upper bound on waiting for response headers once the request is sent.
    #[serde(
        rename = "response_timeout_ms",
        with = "millis",
        default = "default_response_timeout"
    )]
    pub response_timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    pub fn with_dial_timeout(mut self, timeout: Duration) -> Self {
        self.dial_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Read `TSDB_ENDPOINT`, `TSDB_DIAL_TIMEOUT_MS` and `TSDB_RESPONSE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = lookup(ENV_ENDPOINT)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingEndpoint(ENV_ENDPOINT))?;

        let mut config = Self::new(endpoint);
        if let Some(timeout) = parse_millis(&lookup, ENV_DIAL_TIMEOUT_MS)? {
            config.dial_timeout = timeout;
        }
        if let Some(timeout) = parse_millis(&lookup, ENV_RESPONSE_TIMEOUT_MS)? {
            config.response_timeout = timeout;
        }
        Ok(config)
    }

    /// Check the endpoint rules in order; the first failure wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidEndpointScheme);
        }
        if self.endpoint.ends_with('/') {
            return Err(ConfigError::InvalidEndpointTrailingSlash);
        }
        Ok(())
    }
}

fn parse_millis<F>(lookup: &F, var: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| ConfigError::InvalidTimeout { var, value })
}

fn default_dial_timeout() -> Duration {
    DEFAULT_DIAL_TIMEOUT
}

fn default_response_timeout() -> Duration {
    DEFAULT_RESPONSE_TIMEOUT
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
