//! Access phase: answer from the cache before the upstream is contacted.

use tracing::{debug, error, info};

use super::entry::CacheEntry;
use super::error::CacheError;
use super::gate;
use super::headers;
use super::host::InboundRequest;
use super::key::CacheKey;
use super::store::CacheStore;
use crate::http::Response;

/// Outcome of the access phase.
#[derive(Debug)]
pub enum Lookup {
    /// The request is not eligible; the store was not consulted.
    Bypass,
    /// Nothing usable was found, or the lookup failed. The request goes upstream.
    Miss,
    /// Serve this response and end the request here.
    Hit(Response),
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Runs the access phase for one request.
///
/// Never fails: store errors, undecodable entries and accessor failures are
/// logged and reported as [`Lookup::Miss`].
pub async fn lookup<R>(store: &dyn CacheStore, request: &R) -> Lookup
where
    R: InboundRequest + ?Sized,
{
    if !gate::should_lookup(request) {
        return Lookup::Bypass;
    }

    match try_lookup(store, request).await {
        Ok(Some(response)) => Lookup::Hit(response),
        Ok(None) => Lookup::Miss,
        Err(e) => {
            error!(error = %e, "cache lookup failed");
            Lookup::Miss
        }
    }
}

async fn try_lookup<R>(store: &dyn CacheStore, request: &R) -> Result<Option<Response>, CacheError>
where
    R: InboundRequest + ?Sized,
{
    let identifier = request.path_with_query()?;
    let key = CacheKey::derive(&identifier);

    let raw = match store.get(key.as_str()).await? {
        Some(raw) if !raw.is_empty() => raw,
        _ => {
            info!(%key, "no cached entry");
            return Ok(None);
        }
    };

    let entry = CacheEntry::decode(&raw)?;
    let response = replay(entry)?;
    debug!(%key, status = response.status().as_u16(), "serving cached response");
    Ok(Some(response))
}

fn replay(entry: CacheEntry) -> Result<Response, CacheError> {
    let status = entry.status_code()?;
    let body = entry.body_text()?;
    let headers = headers::hit(entry.header_list(), &entry.expiry);
    Ok(Response::from_parts(status, headers, body))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache::config::Ttl;
    use crate::cache::store::MemoryStore;
    use crate::cache::store::doubles::UnreachableStore;
    use crate::http::{Headers, Request, StatusCode};

    const EXPIRY: &str = "Fri, 16 Oct 2026 12:00:00 GMT";

    fn request(raw: &str) -> Request {
        Request::parse(raw.as_bytes()).unwrap().0
    }

    async fn seed(store: &MemoryStore, target: &str, raw: &str) {
        store
            .set(CacheKey::derive(target).as_str(), raw.to_owned(), Ttl::from_secs(60))
            .await
            .unwrap();
    }

    fn entry_json() -> String {
        let headers = Headers::new().with("Content-Type", "application/json");
        CacheEntry::new(StatusCode::OK, &headers, EXPIRY, json!({"a": 1}))
            .encode()
            .unwrap()
    }

    #[tokio::test]
    async fn hit_replays_stored_response() {
        let store = MemoryStore::new();
        seed(&store, "/foo?x=1", &entry_json()).await;

        let Lookup::Hit(response) = lookup(&store, &request("GET /foo?x=1 HTTP/1.1\r\n\r\n")).await
        else {
            panic!("expected a hit");
        };
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body_ref(), br#"{"a":1}"#);
        assert_eq!(response.headers().get("X-Cache-Status"), Some("HIT"));
        assert_eq!(response.headers().get("X-Cache-Until"), Some(EXPIRY));
        assert_eq!(response.headers().get("content-type"), Some("application/json"));
    }

    #[tokio::test]
    async fn different_query_misses() {
        let store = MemoryStore::new();
        seed(&store, "/foo?x=1", &entry_json()).await;
        let outcome = lookup(&store, &request("GET /foo?x=2 HTTP/1.1\r\n\r\n")).await;
        assert!(matches!(outcome, Lookup::Miss));
    }

    #[tokio::test]
    async fn empty_value_is_a_miss() {
        let store = MemoryStore::new();
        seed(&store, "/foo", "").await;
        let outcome = lookup(&store, &request("GET /foo HTTP/1.1\r\n\r\n")).await;
        assert!(matches!(outcome, Lookup::Miss));
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let store = MemoryStore::new();
        seed(&store, "/foo", "{\"status\": 200, \"body\":").await;
        let outcome = lookup(&store, &request("GET /foo HTTP/1.1\r\n\r\n")).await;
        assert!(matches!(outcome, Lookup::Miss));
    }

    #[tokio::test]
    async fn no_cache_never_touches_store() {
        let store = UnreachableStore::default();
        let outcome = lookup(
            &store,
            &request("GET /foo HTTP/1.1\r\nCache-Control: no-cache\r\n\r\n"),
        )
        .await;
        assert!(matches!(outcome, Lookup::Bypass));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_a_miss() {
        let store = UnreachableStore::default();
        let outcome = lookup(&store, &request("GET /foo HTTP/1.1\r\n\r\n")).await;
        assert!(matches!(outcome, Lookup::Miss));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn non_origin_target_skips_store() {
        let store = UnreachableStore::default();
        let outcome = lookup(&store, &request("GET http://a/foo HTTP/1.1\r\n\r\n")).await;
        assert!(!outcome.is_hit());
        assert_eq!(store.calls(), 0);
    }
}
