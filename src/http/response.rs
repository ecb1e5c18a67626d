//! HTTP/1.1 response builder.
//!
//! Provides a fluent builder API for constructing HTTP responses and
//! serializing them to a byte buffer for transmission over TCP.

use bytes::{BufMut, BytesMut};
use thiserror::Error;

use super::{Headers, StatusCode};

/// A header could not be appended to a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid header name {name:?}")]
    InvalidName { name: String },

    #[error("invalid value for header {name}")]
    InvalidValue { name: String },
}

/// An HTTP/1.1 response, ready to be serialized and sent.
///
/// # Examples
///
/// ```
/// use respcache::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::OK)
///     .header("Content-Type", "application/json")
///     .body(r#"{"status":"ok"}"#);
///
/// let bytes = response.into_bytes();
/// let text = std::str::from_utf8(&bytes).unwrap();
/// assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
/// assert!(text.contains("Content-Length: 15\r\n"));
/// ```
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Vec<u8>,
    keep_alive: bool,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Vec::new(),
            keep_alive: true,
        }
    }

    /// Assembles a response from an already-built header set and body.
    pub fn from_parts(status: StatusCode, headers: Headers, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            keep_alive: true,
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Appends a header in-place after checking it can be written to the wire.
    ///
    /// Intended for middleware that decorates a response produced downstream.
    /// Names must be non-empty RFC 9110 tokens; values must not contain
    /// control characters other than horizontal tab.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError`] and leaves the response untouched when the name
    /// or value is not valid.
    pub fn try_add_header(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        if name.is_empty() || !name.bytes().all(is_token_byte) {
            return Err(HeaderError::InvalidName {
                name: name.to_owned(),
            });
        }
        if value.bytes().any(|b| (b < 0x20 && b != b'\t') || b == 0x7f) {
            return Err(HeaderError::InvalidValue {
                name: name.to_owned(),
            });
        }
        self.headers.insert(name, value);
        Ok(())
    }

    /// Sets the response body from a string.
    ///
    /// The `Content-Length` header is written automatically by [`into_bytes`](Self::into_bytes).
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into().into_bytes();
        self
    }

    /// Controls whether the `Connection: keep-alive` or `Connection: close` header is written.
    #[must_use]
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers set so far. Framing headers added at serialization
    /// time are not included.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw body bytes.
    pub fn body_ref(&self) -> &[u8] {
        &self.body
    }

    /// Serializes the response into a `BytesMut` buffer using HTTP/1.1 wire format.
    ///
    /// Automatically adds:
    /// - `Content-Type: text/plain; charset=utf-8` if the body is non-empty and no
    ///   `Content-Type` header was set.
    /// - `Content-Length: <n>` (always written, replacing any caller-set value).
    /// - `Connection: keep-alive` or `Connection: close`.
    pub fn into_bytes(mut self) -> BytesMut {
        let content_length = self.body.len();

        if !self.body.is_empty() && !self.headers.contains("content-type") {
            self.headers
                .insert("Content-Type", "text/plain; charset=utf-8");
        }

        self.headers.remove("content-length");
        self.headers.remove("connection");
        let connection = if self.keep_alive {
            "keep-alive"
        } else {
            "close"
        };
        self.headers.insert("Connection", connection);

        let estimated_size = 128 + self.headers.len() * 64 + content_length;
        let mut buf = BytesMut::with_capacity(estimated_size);

        buf.put(
            format!(
                "HTTP/1.1 {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason()
            )
            .as_bytes(),
        );

        for (name, value) in self.headers.iter() {
            buf.put(format!("{name}: {value}\r\n").as_bytes());
        }

        // Content-Length is always the last header before the blank line
        buf.put(format!("Content-Length: {content_length}\r\n").as_bytes());
        buf.put(&b"\r\n"[..]);

        if !self.body.is_empty() {
            buf.put(self.body.as_slice());
        }

        buf
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_string(bytes: BytesMut) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn simple_ok_response() {
        let r = Response::new(StatusCode::OK).body("Hello");
        let s = to_string(r.into_bytes());
        assert!(s.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(s.contains("Content-Length: 5\r\n"));
        assert!(s.ends_with("\r\n\r\nHello"));
    }

    #[test]
    fn unregistered_status_line() {
        let status = StatusCode::from_u16(299).unwrap();
        let s = to_string(Response::new(status).into_bytes());
        assert!(s.starts_with("HTTP/1.1 299 \r\n"));
    }

    #[test]
    fn stale_framing_headers_are_replaced() {
        let headers = Headers::new()
            .with("Content-Length", "999")
            .with("Connection", "close")
            .with("Content-Type", "application/json");
        let r = Response::from_parts(StatusCode::OK, headers, b"{}".to_vec());
        let s = to_string(r.into_bytes());
        assert!(!s.contains("Content-Length: 999"));
        assert!(s.contains("Content-Length: 2\r\n"));
        assert!(s.contains("Connection: keep-alive\r\n"));
        assert!(!s.contains("Connection: close"));
    }

    #[test]
    fn try_add_header_rejects_bad_input() {
        let mut r = Response::new(StatusCode::OK);
        assert!(r.try_add_header("X-Cache-Status", "MISS").is_ok());
        assert_eq!(
            r.try_add_header("Bad Name", "v"),
            Err(HeaderError::InvalidName {
                name: "Bad Name".to_owned()
            })
        );
        assert_eq!(
            r.try_add_header("X-Split", "a\r\nInjected: yes"),
            Err(HeaderError::InvalidValue {
                name: "X-Split".to_owned()
            })
        );
        assert_eq!(r.headers().len(), 1);
    }

    #[test]
    fn connection_close() {
        let r = Response::new(StatusCode::OK).keep_alive(false);
        let s = to_string(r.into_bytes());
        assert!(s.contains("Connection: close\r\n"));
    }
}
