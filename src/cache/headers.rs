//! Observability headers and the header sets that go in and out of the cache.
//!
//! All functions here take a header set by value and return a new one; none
//! of them mutate a map that someone else still holds.

use tracing::warn;

use super::host::UpstreamResponse;
use crate::http::Headers;

pub const X_CACHE_STATUS: &str = "X-Cache-Status";
pub const X_CACHE_KEY: &str = "X-Cache-Key";
pub const X_CACHE_UNTIL: &str = "X-Cache-Until";

// Rewritten on every replay, so never worth persisting.
const FRAMING: [&str; 4] = ["content-length", "transfer-encoding", "connection", "keep-alive"];
const OBSERVABILITY: [&str; 3] = [X_CACHE_STATUS, X_CACHE_KEY, X_CACHE_UNTIL];

/// Whether a response came from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

/// Upstream headers reduced to what is worth replaying later.
pub fn storable(headers: Headers) -> Headers {
    strip(strip(headers, &FRAMING), &OBSERVABILITY)
}

/// Headers for a response served from the cache.
pub fn hit(stored: Headers, expiry: &str) -> Headers {
    strip(strip(stored, &FRAMING), &OBSERVABILITY)
        .with(X_CACHE_STATUS, CacheStatus::Hit.as_str())
        .with(X_CACHE_UNTIL, expiry)
}

/// Headers announcing that a fresh response was just stored.
pub fn miss(key: &str, expiry: &str) -> Headers {
    Headers::new()
        .with(X_CACHE_STATUS, CacheStatus::Miss.as_str())
        .with(X_CACHE_KEY, key)
        .with(X_CACHE_UNTIL, expiry)
}

/// Appends each header to `response`. A header that cannot be added is
/// logged and skipped; the rest are still applied. Returns how many were added.
pub fn append_all<U: UpstreamResponse + ?Sized>(response: &mut U, headers: &Headers) -> usize {
    let mut added = 0;
    for (name, value) in headers.iter() {
        match response.append_header(name, value) {
            Ok(()) => added += 1,
            Err(e) => warn!(header = name, error = %e, "error adding header"),
        }
    }
    added
}

/// Reads the cache status a response was tagged with, if any.
pub fn status_of(headers: &Headers) -> Option<CacheStatus> {
    match headers.get(X_CACHE_STATUS)? {
        "HIT" => Some(CacheStatus::Hit),
        "MISS" => Some(CacheStatus::Miss),
        _ => None,
    }
}

fn strip(headers: Headers, names: &[&str]) -> Headers {
    names.iter().fold(headers, |acc, name| acc.without(name))
}
