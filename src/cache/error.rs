//! Error taxonomy for the caching subsystem.
//!
//! Every variant here ends the current caching attempt only. The phase entry
//! points log them and fall back to normal, uncached traffic.

use std::time::Duration;

use thiserror::Error;

use crate::http::response::HeaderError;

/// Invalid store address or TTL, raised when the store client is built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("store host and port must be provided")]
    MissingAddress,

    #[error("store port {port:?} is not a valid TCP port")]
    InvalidPort { port: String },

    #[error("cached TTL must be non-negative, got {ttl}")]
    NegativeTtl { ttl: i64 },

    #[error("store operation timeout must be positive")]
    ZeroTimeout,

    #[error("malformed cache configuration: {0}")]
    Malformed(String),
}

/// Failure talking to the key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connect(#[source] redis::RedisError),

    #[error("store command {command} failed: {source}")]
    Command {
        command: &'static str,
        #[source]
        source: redis::RedisError,
    },

    #[error("store {command} timed out after {after:?}")]
    Timeout {
        command: &'static str,
        after: Duration,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Malformed stored JSON, an upstream body that is not JSON, or a marshal failure.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode cache entry: {0}")]
    DecodeEntry(#[source] serde_json::Error),

    #[error("failed to encode cache entry: {0}")]
    EncodeEntry(#[source] serde_json::Error),

    #[error("response body is not JSON: {0}")]
    Body(#[source] serde_json::Error),

    #[error("cached status {status} is not a valid HTTP status")]
    Status { status: u16 },
}

/// The host could not supply a piece of the request or response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessorError {
    #[error("request target {target:?} is not in origin form")]
    InvalidTarget { target: String },

    #[error("response carries {count} headers, more than the {max} allowed")]
    TooManyHeaders { count: usize, max: usize },

    #[error("{what} unavailable: {reason}")]
    Unavailable { what: &'static str, reason: String },

    #[error(transparent)]
    Header(#[from] HeaderError),
}

/// Umbrella error for one caching attempt.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Accessor(#[from] AccessorError),
}
