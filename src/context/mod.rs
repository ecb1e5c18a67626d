//! Per-request context handed through the middleware pipeline.

use crate::Request;

/// Per-request context.
///
/// One `Context` is created per parsed request and moved through the
/// middleware stack; whichever stage produces the response consumes it.
pub struct Context {
    request: Request,
}

impl Context {
    /// Create a new context from a request
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }
}
