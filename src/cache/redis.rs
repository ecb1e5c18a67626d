//! Redis-backed [`CacheStore`].

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, IntoConnectionInfo};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::config::{Ttl, ValidatedConfig};
use super::error::{ConfigError, StoreError};
use super::store::{CacheStore, StoreFuture};

/// Shared Redis client.
///
/// Built once at startup from a [`ValidatedConfig`] and shared by every
/// request. The underlying connection is multiplexed and reconnects on its
/// own; it is established on first use, so an unreachable server at startup
/// only turns the first lookups into store errors. Every command, including
/// the initial connect, is bounded by the configured operation timeout.
///
/// Dropping the last handle closes the connection.
pub struct RedisStore {
    client: Client,
    connection: OnceCell<ConnectionManager>,
    operation_timeout: Duration,
}

impl RedisStore {
    /// Builds the client. No network traffic happens here.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Malformed`] if the address cannot be turned into
    /// connection parameters.
    pub fn new(config: &ValidatedConfig) -> Result<Self, ConfigError> {
        let mut info = (config.host(), config.port())
            .into_connection_info()
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        info.redis.password = config.password().map(str::to_owned);

        let client = Client::open(info).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        info!(
            host = config.host(),
            port = config.port(),
            timeout = ?config.operation_timeout(),
            "redis store configured"
        );

        Ok(Self {
            client,
            connection: OnceCell::new(),
            operation_timeout: config.operation_timeout(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = bounded(
                    "CONNECT",
                    self.operation_timeout,
                    ConnectionManager::new(self.client.clone()),
                )
                .await?
                .map_err(StoreError::Connect)?;
                debug!("redis connection established");
                Ok::<_, StoreError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

impl CacheStore for RedisStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut conn = self.connection().await?;
            bounded("GET", self.operation_timeout, conn.get::<_, Option<String>>(key))
                .await?
                .map_err(|source| StoreError::Command {
                    command: "GET",
                    source,
                })
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String, ttl: Ttl) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let mut conn = self.connection().await?;
            let (command, result) = if ttl.is_unbounded() {
                (
                    "SET",
                    bounded("SET", self.operation_timeout, conn.set::<_, _, ()>(key, value))
                        .await?,
                )
            } else {
                (
                    "SETEX",
                    bounded(
                        "SETEX",
                        self.operation_timeout,
                        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()),
                    )
                    .await?,
                )
            };
            result.map_err(|source| StoreError::Command { command, source })
        })
    }
}

async fn bounded<F: Future>(
    command: &'static str,
    after: Duration,
    fut: F,
) -> Result<F::Output, StoreError> {
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| StoreError::Timeout { command, after })
}
