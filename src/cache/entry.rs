//! The persisted cache envelope and its JSON codec.
//!
//! Wire shape:
//!
//! ```json
//! { "status": 200, "headers": {"Content-Type": ["application/json"]},
//!   "ttl": "Mon, 02 Jan 2006 15:04:05 GMT", "body": {"a": 1} }
//! ```
//!
//! Entries written by earlier deployments used capitalized keys
//! (`Status`, `Headers`, `TTL`, `Body`); those still decode.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::CodecError;
use crate::http::{Headers, StatusCode};

/// One cached response. Built once at write time and never mutated in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(alias = "Status")]
    pub status: u16,

    /// Header name to its values, in arrival order.
    #[serde(alias = "Headers", default, deserialize_with = "null_as_empty")]
    pub headers: BTreeMap<String, Vec<String>>,

    /// Informational expiry timestamp; the store's own TTL is authoritative.
    #[serde(rename = "ttl", alias = "TTL")]
    pub expiry: String,

    /// The upstream body, kept as an opaque JSON value.
    #[serde(alias = "Body", default)]
    pub body: Value,
}

impl CacheEntry {
    /// Builds an entry, grouping repeated header names (case-insensitively,
    /// keeping the first spelling seen) into one value list.
    pub fn new(status: StatusCode, headers: &Headers, expiry: impl Into<String>, body: Value) -> Self {
        let mut spellings: HashMap<String, String> = HashMap::new();
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in headers.iter() {
            let slot = spellings
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| name.to_owned());
            grouped.entry(slot.clone()).or_default().push(value.to_owned());
        }

        Self {
            status: status.as_u16(),
            headers: grouped,
            expiry: expiry.into(),
            body,
        }
    }

    pub fn decode(raw: &str) -> Result<Self, CodecError> {
        serde_json::from_str(raw).map_err(CodecError::DecodeEntry)
    }

    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(CodecError::EncodeEntry)
    }

    /// The stored status as a replayable [`StatusCode`].
    pub fn status_code(&self) -> Result<StatusCode, CodecError> {
        StatusCode::from_u16(self.status).ok_or(CodecError::Status {
            status: self.status,
        })
    }

    /// Flattens the grouped headers back into a header list.
    pub fn header_list(&self) -> Headers {
        self.headers
            .iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name.as_str(), v.as_str())))
            .collect()
    }

    /// Serializes the body back to JSON text.
    pub fn body_text(&self) -> Result<String, CodecError> {
        serde_json::to_string(&self.body).map_err(CodecError::EncodeEntry)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Vec<String>>>::deserialize(deserializer)?.unwrap_or_default())
}
