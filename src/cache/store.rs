//! Key-value store abstraction and the in-process implementation.
//!
//! The cache needs exactly two commands from a store: `GET key` and
//! `SET key value EXPIRE-AFTER seconds`. Anything that can answer those,
//! distinguishing "not found" from a failure, can back the cache.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use tokio::time::Instant;

use super::config::Ttl;
use super::error::StoreError;

/// Boxed future returned by [`CacheStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// A shared handle to a key-value store with native expiry.
///
/// Implementations are constructed once and shared across all concurrent
/// requests, so they must be safe for concurrent use. They must also bound
/// every call in time; a slow store is reported as [`StoreError::Timeout`].
pub trait CacheStore: Send + Sync {
    /// Fetches the value under `key`. `Ok(None)` means the key does not exist.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Stores `value` under `key`, overwriting any previous value.
    ///
    /// The store expires the key after `ttl`; [`Ttl::is_unbounded`] means no expiry.
    fn set<'a>(&'a self, key: &'a str, value: String, ttl: Ttl) -> StoreFuture<'a, ()>;
}

/// In-process store with per-entry deadlines.
///
/// Expired entries are dropped lazily when read. Suitable for tests and
/// single-process deployments; entries are not shared between processes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Slot>>,
}

#[derive(Debug)]
struct Slot {
    value: String,
    deadline: Option<Instant>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, including ones that expired but were not read since.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Slot>> {
        self.entries.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl CacheStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let mut entries = self.lock();
            let expired = match entries.get(key) {
                None => return Ok(None),
                Some(slot) => slot.deadline.is_some_and(|d| Instant::now() >= d),
            };
            if expired {
                entries.remove(key);
                return Ok(None);
            }
            Ok(entries.get(key).map(|slot| slot.value.clone()))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String, ttl: Ttl) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            // A deadline past the clock's range is as good as none.
            let deadline = if ttl.is_unbounded() {
                None
            } else {
                Instant::now().checked_add(ttl.as_duration())
            };
            self.lock()
                .insert(key.to_owned(), Slot { value, deadline });
            Ok(())
        })
    }
}

#[cfg(test)]
pub(crate) mod doubles {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// A store whose every call fails as if the server were unreachable.
    #[derive(Debug, Default)]
    pub(crate) struct UnreachableStore {
        pub(crate) calls: AtomicUsize,
    }

    impl UnreachableStore {
        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CacheStore for UnreachableStore {
        fn get<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(StoreError::Unavailable("connection refused".to_owned())) })
        }

        fn set<'a>(&'a self, _key: &'a str, _value: String, _ttl: Ttl) -> StoreFuture<'a, ()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(StoreError::Unavailable("connection refused".to_owned())) })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = MemoryStore::new();
        store.set("k", "e1".to_owned(), Ttl::from_secs(60)).await.unwrap();
        store.set("k", "e2".to_owned(), Ttl::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("e2"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store.set("k", "v".to_owned(), Ttl::from_secs(2)).await.unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_never_expires() {
        let store = MemoryStore::new();
        store.set("k", "v".to_owned(), Ttl::from_secs(0)).await.unwrap();
        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
