//! Async TCP server using Tokio.
//!
//! Accepts TCP connections and dispatches HTTP/1.1 requests through a
//! middleware pipeline. Supports HTTP/1.1 persistent connections (keep-alive)
//! out of the box.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::context::Context;
use crate::http::{
    StatusCode,
    request::{Request, RequestError},
    response::Response,
};
use crate::middleware::{MiddlewareHandler, Next};

/// Errors produced by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maximum size of a complete HTTP request, head plus declared body, that we
/// will buffer before rejecting it (8 MiB).
const MAX_REQUEST_SIZE: usize = 8 * 1024 * 1024;

/// Initial read buffer capacity per connection.
const INITIAL_BUF_SIZE: usize = 4096;

/// The HTTP server hosting the middleware pipeline.
///
/// # Examples
///
/// ```rust,no_run
/// use respcache::server::Server;
/// use respcache::middleware::handler;
/// use respcache::http::{Response, StatusCode};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = Server::bind("127.0.0.1:8080").await?;
///     server.serve(vec![handler(|_ctx| async {
///         Response::new(StatusCode::OK).body("Hello!")
///     })]).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Server {
    /// Binds the server to the given TCP address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound
    /// (e.g. port already in use, insufficient permissions).
    pub async fn bind(addr: impl AsRef<str>) -> Result<Self, ServerError> {
        let addr = addr.as_ref();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.to_owned(),
                source: e,
            })?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Starts accepting connections and runs every request through `pipeline`.
    ///
    /// The stack is shared by all connections; the last entry is expected to be
    /// a terminal [`handler`](crate::middleware::handler). Runs until the
    /// process is terminated or the owning task is aborted.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the TCP listener itself fails.
    pub async fn serve(self, pipeline: Vec<MiddlewareHandler>) -> Result<(), ServerError> {
        let pipeline: Arc<[MiddlewareHandler]> = pipeline.into();
        info!(address = %self.local_addr, stages = pipeline.len(), "respcache listening");

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    error!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            debug!(peer = %peer_addr, "connection accepted");
            let pipeline = Arc::clone(&pipeline);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, peer_addr, pipeline).await {
                    warn!(peer = %peer_addr, error = %e, "connection closed with error");
                }
            });
        }
    }
}

/// Handles a single TCP connection over its lifetime.
///
/// HTTP/1.1 connections are persistent by default: we loop, reading one
/// request per iteration, until the peer closes the connection or signals
/// `Connection: close`.
async fn handle_connection(
    mut stream: TcpStream,
    peer_addr: SocketAddr,
    pipeline: Arc<[MiddlewareHandler]>,
) -> Result<(), std::io::Error> {
    let mut buf = BytesMut::with_capacity(INITIAL_BUF_SIZE);

    loop {
        // Only block on the socket when the buffer holds no complete request.
        let parsed = if buf.is_empty() {
            Err(RequestError::Incomplete)
        } else {
            Request::parse(&buf)
        };

        let (request, body_offset) = match parsed {
            Ok(pair) => pair,
            Err(RequestError::Incomplete) => {
                if stream.read_buf(&mut buf).await? == 0 {
                    debug!(peer = %peer_addr, "connection closed by peer");
                    break;
                }
                if buf.len() > MAX_REQUEST_SIZE {
                    warn!(peer = %peer_addr, "request too large: sending 413");
                    let response = Response::new(StatusCode::PAYLOAD_TOO_LARGE)
                        .body("Request entity too large")
                        .keep_alive(false);
                    stream.write_all(&response.into_bytes()).await?;
                    break;
                }
                continue;
            }
            Err(e) => {
                warn!(peer = %peer_addr, error = %e, "bad request: sending 400");
                let response = Response::new(StatusCode::BAD_REQUEST)
                    .body(format!("Bad Request: {e}"))
                    .keep_alive(false);
                stream.write_all(&response.into_bytes()).await?;
                break;
            }
        };

        let content_length = request.content_length().unwrap_or(0);
        if content_length > MAX_REQUEST_SIZE.saturating_sub(body_offset) {
            warn!(peer = %peer_addr, content_length, "declared body too large: sending 413");
            let response = Response::new(StatusCode::PAYLOAD_TOO_LARGE)
                .body("Request entity too large")
                .keep_alive(false);
            stream.write_all(&response.into_bytes()).await?;
            break;
        }

        // Wait for the full body to arrive if Content-Length is set.
        let total_needed = body_offset + content_length;
        if buf.len() < total_needed {
            if stream.read_buf(&mut buf).await? == 0 {
                break;
            }
            continue;
        }

        let keep_alive = request.is_keep_alive();

        debug!(
            peer = %peer_addr,
            method = %request.method(),
            target = %request.path_with_query(),
            "dispatching request"
        );

        let response = Next::new(Arc::clone(&pipeline))
            .run(Context::new(request))
            .await
            .keep_alive(keep_alive);
        stream.write_all(&response.into_bytes()).await?;
        stream.flush().await?;

        // Drop the consumed request bytes from the buffer.
        let _ = buf.split_to(total_needed);

        if !keep_alive {
            debug!(peer = %peer_addr, "client requested close, shutting down");
            break;
        }
    }

    Ok(())
}
