//! Response phase: persist eligible upstream responses.

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use tracing::{debug, error};

use super::config::Ttl;
use super::entry::CacheEntry;
use super::error::{AccessorError, CacheError, CodecError};
use super::headers;
use super::host::{MAX_STORED_HEADERS, UpstreamResponse};
use super::key::CacheKey;
use super::store::CacheStore;
use crate::http::StatusCode;

/// Highest status that is ever stored.
///
/// Only 200, 201 and 202 qualify; 203 and every other 2xx are left alone.
pub const SUCCESS_BOUNDARY: StatusCode = StatusCode::ACCEPTED;

/// RFC 1123 date in GMT, the format of `X-Cache-Until`.
pub const EXPIRY_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Outcome of the response phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The status is above [`SUCCESS_BOUNDARY`]; nothing was attempted.
    Ineligible { status: StatusCode },
    /// The entry is in the store and the response carries the MISS headers.
    Stored { key: CacheKey, expiry: String },
    /// Something went wrong and was logged; the response is untouched.
    Failed,
}

/// Runs the response phase for one upstream response.
///
/// `identifier` is the request's path and query, captured before the request
/// was handed upstream. Never fails: every error is logged and leaves the
/// response exactly as the upstream produced it.
pub async fn persist<U>(
    store: &dyn CacheStore,
    ttl: Ttl,
    identifier: Result<String, AccessorError>,
    response: &mut U,
) -> WriteOutcome
where
    U: UpstreamResponse + Sync + ?Sized,
{
    let status = match response.status() {
        Ok(status) => status,
        Err(e) => {
            error!(error = %e, "failed to get response status");
            return WriteOutcome::Failed;
        }
    };
    if status > SUCCESS_BOUNDARY {
        debug!(status = status.as_u16(), "response not eligible for caching");
        return WriteOutcome::Ineligible { status };
    }

    match try_persist(store, ttl, status, identifier, response).await {
        Ok((key, expiry)) => {
            headers::append_all(response, &headers::miss(key.as_str(), &expiry));
            debug!(%key, %expiry, "response cached");
            WriteOutcome::Stored { key, expiry }
        }
        Err(e) => {
            error!(error = %e, "failed to cache response");
            WriteOutcome::Failed
        }
    }
}

async fn try_persist<U>(
    store: &dyn CacheStore,
    ttl: Ttl,
    status: StatusCode,
    identifier: Result<String, AccessorError>,
    response: &U,
) -> Result<(CacheKey, String), CacheError>
where
    U: UpstreamResponse + Sync + ?Sized,
{
    let body: Value = serde_json::from_slice(response.raw_body()?).map_err(CodecError::Body)?;
    let key = CacheKey::derive(&identifier?);
    let expiry = expiry_after(Utc::now(), ttl);
    let stored_headers = headers::storable(response.headers(MAX_STORED_HEADERS)?);

    let value = CacheEntry::new(status, &stored_headers, expiry.clone(), body).encode()?;
    store.set(key.as_str(), value, ttl).await?;

    Ok((key, expiry))
}

/// Formats `now + ttl`, saturating at the latest representable instant.
pub fn expiry_after(now: DateTime<Utc>, ttl: Ttl) -> String {
    let delta = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX);
    now.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .format(EXPIRY_FORMAT)
        .to_string()
}
