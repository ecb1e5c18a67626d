//! # respcache
//!
//! A fail-open HTTP response cache that runs as a stage in an async
//! HTTP/1.1 middleware pipeline, backed by Redis.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use respcache::cache::{CacheConfig, CacheMiddleware};
//! use respcache::middleware::{LoggerMiddleware, from_middleware, handler};
//! use respcache::{Response, Server, StatusCode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CacheConfig::new("127.0.0.1", "6379", 300);
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     server
//!         .serve(vec![
//!             from_middleware(Arc::new(LoggerMiddleware)),
//!             from_middleware(Arc::new(CacheMiddleware::from_config(&config))),
//!             handler(|_ctx| async {
//!                 Response::new(StatusCode::OK)
//!                     .header("Content-Type", "application/json")
//!                     .body(r#"{"hello":"world"}"#)
//!             }),
//!         ])
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod context;
pub mod http;
pub mod middleware;
pub mod server;

pub use cache::{CacheConfig, CacheMiddleware, CacheStore, MemoryStore, RedisStore, Ttl};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use server::{Server, ServerError};
