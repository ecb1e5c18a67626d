//! Fail-open HTTP response cache.
//!
//! The cache works in two phases around the upstream call:
//!
//! - **Access** ([`reader::lookup`]): an eligible `GET` is hashed into a
//!   [`CacheKey`] and looked up; a decodable entry is replayed immediately.
//! - **Response** ([`writer::persist`]): a `200`-`202` JSON response is
//!   wrapped in a [`CacheEntry`] and written back with the configured [`Ttl`].
//!
//! [`CacheMiddleware`] runs both phases as one pipeline stage. Neither phase
//! can fail the request: every error in this module is logged and the request
//! proceeds as if no cache were present.
//!
//! Storage sits behind [`CacheStore`]; [`RedisStore`] is the production
//! backend and [`MemoryStore`] keeps entries in process.

pub mod config;
pub mod entry;
pub mod error;
pub mod gate;
pub mod headers;
pub mod host;
pub mod key;
pub mod middleware;
pub mod reader;
pub mod redis;
pub mod store;
pub mod writer;

pub use config::{CacheConfig, DEFAULT_OPERATION_TIMEOUT, Ttl, ValidatedConfig};
pub use entry::CacheEntry;
pub use error::{AccessorError, CacheError, CodecError, ConfigError, StoreError};
pub use headers::{CacheStatus, X_CACHE_KEY, X_CACHE_STATUS, X_CACHE_UNTIL};
pub use host::{InboundRequest, MAX_STORED_HEADERS, UpstreamResponse};
pub use key::CacheKey;
pub use middleware::CacheMiddleware;
pub use reader::Lookup;
pub use self::redis::RedisStore;
pub use store::{CacheStore, MemoryStore, StoreFuture};
pub use writer::{SUCCESS_BOUNDARY, WriteOutcome};
