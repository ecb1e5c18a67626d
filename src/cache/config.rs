//! Cache configuration and its single validation point.
//!
//! [`CacheConfig`] is the raw, deserializable shape (field names match the
//! gateway configuration keys operators already use). It is turned into a
//! [`ValidatedConfig`] exactly once, when the store client is built.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use super::error::ConfigError;

/// Default bound on every store round trip.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw cache configuration as supplied by the operator.
///
/// # Examples
///
/// ```
/// use respcache::cache::CacheConfig;
///
/// let config = CacheConfig::from_json(
///     r#"{"cached_ttl": 60, "redis_host": "127.0.0.1", "redis_port": "6379"}"#,
/// )
/// .unwrap();
/// let validated = config.validate().unwrap();
/// assert_eq!(validated.ttl().as_secs(), 60);
/// assert_eq!(validated.port(), 6379);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    pub cached_ttl: i64,
    pub redis_host: String,
    #[serde(deserialize_with = "port_string")]
    pub redis_port: String,
    #[serde(default)]
    pub redis_password: Option<String>,
    #[serde(default)]
    pub operation_timeout_ms: Option<u64>,
}

impl CacheConfig {
    /// Starts a configuration for the given store address and TTL in seconds.
    pub fn new(host: impl Into<String>, port: impl Into<String>, cached_ttl: i64) -> Self {
        Self {
            cached_ttl,
            redis_host: host.into(),
            redis_port: port.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.redis_password = Some(password.into());
        self
    }

    #[must_use]
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Parses a JSON configuration document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] when the document does not have the expected shape.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Checks the configuration and produces the form the store client consumes.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingAddress`]: host or port is empty.
    /// - [`ConfigError::InvalidPort`]: port is not a number in `1..=65535`.
    /// - [`ConfigError::NegativeTtl`]: `cached_ttl < 0`.
    /// - [`ConfigError::ZeroTimeout`]: an explicit operation timeout of zero.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let host = self.redis_host.trim();
        let port = self.redis_port.trim();
        if host.is_empty() || port.is_empty() {
            return Err(ConfigError::MissingAddress);
        }
        let port = match port.parse::<u16>() {
            Ok(p) if p != 0 => p,
            _ => {
                return Err(ConfigError::InvalidPort {
                    port: self.redis_port.clone(),
                });
            }
        };
        let ttl = u64::try_from(self.cached_ttl)
            .map(Ttl::from_secs)
            .map_err(|_| ConfigError::NegativeTtl {
                ttl: self.cached_ttl,
            })?;
        let operation_timeout = match self.operation_timeout_ms {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(ms) => Duration::from_millis(ms),
            None => DEFAULT_OPERATION_TIMEOUT,
        };

        Ok(ValidatedConfig {
            host: host.to_owned(),
            port,
            password: self.redis_password.clone().filter(|p| !p.is_empty()),
            ttl,
            operation_timeout,
        })
    }
}

/// Configuration that passed [`CacheConfig::validate`].
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    host: String,
    port: u16,
    password: Option<String>,
    ttl: Ttl,
    operation_timeout: Duration,
}

impl ValidatedConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }
}

impl std::fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("ttl", &self.ttl)
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

/// How long the store keeps an entry. Zero means the entry never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(u64);

impl Ttl {
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.0)
    }

    /// Returns `true` when entries are stored without an expiry.
    pub fn is_unbounded(self) -> bool {
        self.0 == 0
    }
}

// Ports arrive as strings from gateway-style configs, but a bare number is accepted too.
fn port_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Text(String),
        Number(u64),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Text(s) => s,
        Port::Number(n) => n.to_string(),
    })
}
