//! The response cache as a pipeline stage.

use std::sync::Arc;

use tracing::{error, warn};

use super::config::{CacheConfig, Ttl};
use super::error::ConfigError;
use super::host::InboundRequest;
use super::reader::{self, Lookup};
use super::redis::RedisStore;
use super::store::CacheStore;
use super::writer;
use crate::context::Context;
use crate::middleware::{BoxResponseFuture, Middleware, Next};

/// Serves repeated `GET` requests from a shared store.
///
/// Before the request goes upstream the stage looks the request up and, on a
/// hit, answers it directly with `X-Cache-Status: HIT`. Otherwise the request
/// continues down the pipeline, and a `200`-`202` response with a JSON body is
/// written back to the store and tagged `X-Cache-Status: MISS`.
///
/// Cache trouble of any kind is logged and ignored; the client always gets
/// either a cached response or the upstream one.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use respcache::cache::{CacheMiddleware, MemoryStore, Ttl};
/// use respcache::middleware::from_middleware;
///
/// let cache = CacheMiddleware::new(Arc::new(MemoryStore::new()), Ttl::from_secs(300));
/// let stage = from_middleware(Arc::new(cache));
/// ```
pub struct CacheMiddleware {
    store: Option<Arc<dyn CacheStore>>,
    ttl: Ttl,
}

impl CacheMiddleware {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Ttl) -> Self {
        Self {
            store: Some(store),
            ttl,
        }
    }

    /// A stage that passes every request straight through.
    pub fn disabled() -> Self {
        Self {
            store: None,
            ttl: Ttl::from_secs(0),
        }
    }

    /// Validates `config` and builds a Redis-backed stage.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] raised while validating the configuration or
    /// building the client. No connection is attempted here.
    pub fn try_from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        let validated = config.validate()?;
        let store = RedisStore::new(&validated)?;
        Ok(Self::new(Arc::new(store), validated.ttl()))
    }

    /// Like [`try_from_config`](Self::try_from_config), but an invalid
    /// configuration is logged and yields a [`disabled`](Self::disabled) stage.
    pub fn from_config(config: &CacheConfig) -> Self {
        match Self::try_from_config(config) {
            Ok(stage) => stage,
            Err(e) => {
                error!(error = %e, "invalid cache configuration, caching disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn ttl(&self) -> Ttl {
        self.ttl
    }
}

impl Middleware for CacheMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> BoxResponseFuture {
        let Some(store) = self.store.clone() else {
            return Box::pin(next.run(ctx));
        };
        let ttl = self.ttl;

        Box::pin(async move {
            if let Lookup::Hit(cached) = reader::lookup(store.as_ref(), ctx.request()).await {
                return cached;
            }

            // The upstream consumes the request, so take the identifier now.
            let identifier = InboundRequest::path_with_query(ctx.request());
            if let Err(e) = &identifier {
                warn!(error = %e, "request has no cacheable identifier");
            }

            let mut response = next.run(ctx).await;
            writer::persist(store.as_ref(), ttl, identifier, &mut response).await;
            response
        })
    }
}
