//! What the cache needs from the host around it.
//!
//! The read and write phases only see requests and responses through these
//! traits. Every accessor is fallible: a host that cannot produce a value
//! makes the cache stand aside for that request.

use crate::http::{Headers, Method, Request, Response, StatusCode};

use super::error::AccessorError;

/// Largest number of response headers copied into a cache entry.
pub const MAX_STORED_HEADERS: usize = 100;

/// Read access to the inbound request.
pub trait InboundRequest {
    fn method(&self) -> Result<Method, AccessorError>;

    /// Path plus query string, the identifier a cache key is derived from.
    fn path_with_query(&self) -> Result<String, AccessorError>;

    /// First value of the named header, if present.
    fn header(&self, name: &str) -> Result<Option<String>, AccessorError>;
}

/// Access to the upstream response on its way back to the client.
pub trait UpstreamResponse {
    fn status(&self) -> Result<StatusCode, AccessorError>;

    fn raw_body(&self) -> Result<&[u8], AccessorError>;

    /// All response headers, failing when there are more than `max`.
    fn headers(&self, max: usize) -> Result<Headers, AccessorError>;

    /// Appends a header to the response the client will receive.
    fn append_header(&mut self, name: &str, value: &str) -> Result<(), AccessorError>;
}

impl InboundRequest for Request {
    fn method(&self) -> Result<Method, AccessorError> {
        Ok(Request::method(self).clone())
    }

    fn path_with_query(&self) -> Result<String, AccessorError> {
        let target = Request::path_with_query(self);
        // Authority-form (CONNECT) and asterisk-form (OPTIONS *) targets name no resource.
        if !target.starts_with('/') {
            return Err(AccessorError::InvalidTarget {
                target: target.to_owned(),
            });
        }
        Ok(target.to_owned())
    }

    fn header(&self, name: &str) -> Result<Option<String>, AccessorError> {
        Ok(self.headers().get(name).map(str::to_owned))
    }
}

impl UpstreamResponse for Response {
    fn status(&self) -> Result<StatusCode, AccessorError> {
        Ok(Response::status(self))
    }

    fn raw_body(&self) -> Result<&[u8], AccessorError> {
        Ok(self.body_ref())
    }

    fn headers(&self, max: usize) -> Result<Headers, AccessorError> {
        let headers = Response::headers(self);
        if headers.len() > max {
            return Err(AccessorError::TooManyHeaders {
                count: headers.len(),
                max,
            });
        }
        Ok(headers.clone())
    }

    fn append_header(&mut self, name: &str, value: &str) -> Result<(), AccessorError> {
        Ok(self.try_add_header(name, value)?)
    }
}
