#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use respcache::cache::{CacheMiddleware, CacheStore, StoreError, StoreFuture, Ttl};
use respcache::middleware::{LoggerMiddleware, from_middleware, handler};
use respcache::{Response, Server, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Routes log output through the test harness; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A server running the logger, the cache and a canned upstream.
pub struct CachedService {
    pub addr: SocketAddr,
    upstream_calls: Arc<AtomicUsize>,
}

impl CachedService {
    pub async fn start(cache: CacheMiddleware, status: StatusCode, body: &'static str) -> Self {
        init_tracing();
        let upstream_calls = Arc::new(AtomicUsize::new(0));
        let calls = Arc::clone(&upstream_calls);

        let server = Server::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = server.local_addr();
        let pipeline = vec![
            from_middleware(Arc::new(LoggerMiddleware)),
            from_middleware(Arc::new(cache)),
            handler(move |_ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    Response::new(status)
                        .header("Content-Type", "application/json")
                        .body(body)
                }
            }),
        ];
        tokio::spawn(server.serve(pipeline));

        Self {
            addr,
            upstream_calls,
        }
    }

    pub fn upstream_calls(&self) -> usize {
        self.upstream_calls.load(Ordering::SeqCst)
    }

    /// Sends one request with `Connection: close` and reads the whole reply.
    pub async fn request(&self, method: &str, target: &str, extra_headers: &[(&str, &str)]) -> RawResponse {
        let mut raw = format!("{method} {target} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n");
        for (name, value) in extra_headers {
            raw.push_str(&format!("{name}: {value}\r\n"));
        }
        if method != "GET" {
            raw.push_str("Content-Length: 0\r\n");
        }
        raw.push_str("\r\n");

        self.send_raw(raw.as_bytes()).await
    }

    /// Writes `raw` as-is and reads until the server closes the connection.
    pub async fn send_raw(&self, raw: &[u8]) -> RawResponse {
        let mut stream = TcpStream::connect(self.addr).await.expect("connect");
        stream.write_all(raw).await.expect("write request");
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.expect("read response");
        RawResponse::parse(&buf)
    }

    pub async fn get(&self, target: &str) -> RawResponse {
        self.request("GET", target, &[]).await
    }
}

/// A response as the client saw it on the wire.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    fn parse(buf: &[u8]) -> Self {
        let mut headers = [httparse::EMPTY_HEADER; 64];
        let mut parsed = httparse::Response::new(&mut headers);
        let head_len = match parsed.parse(buf).expect("valid response head") {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => panic!("truncated response head"),
        };
        Self {
            status: parsed.code.expect("status code"),
            headers: parsed
                .headers
                .iter()
                .map(|h| {
                    (
                        h.name.to_owned(),
                        String::from_utf8_lossy(h.value).into_owned(),
                    )
                })
                .collect(),
            body: buf[head_len..].to_vec(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn header_count(&self, name: &str) -> usize {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .count()
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).expect("utf-8 body")
    }
}

/// A store that refuses every command, counting the attempts.
#[derive(Debug, Default)]
pub struct RefusingStore {
    calls: AtomicUsize,
}

impl RefusingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CacheStore for RefusingStore {
    fn get<'a>(&'a self, _key: &'a str) -> StoreFuture<'a, Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(StoreError::Unavailable("connection refused".to_owned())) })
    }

    fn set<'a>(&'a self, _key: &'a str, _value: String, _ttl: Ttl) -> StoreFuture<'a, ()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Err(StoreError::Unavailable("connection refused".to_owned())) })
    }
}
