//! A small JSON API behind the response cache.
//!
//! ```text
//! cargo run --example cached_api                       # in-process store
//! REDIS_HOST=127.0.0.1 REDIS_PORT=6379 cargo run --example cached_api
//! curl -i http://127.0.0.1:8080/items?page=1           # X-Cache-Status: MISS, then HIT
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use respcache::cache::{CacheConfig, CacheMiddleware, MemoryStore, Ttl};
use respcache::context::Context;
use respcache::middleware::{LoggerMiddleware, from_middleware, handler};
use respcache::{Response, Server, StatusCode};
use tracing_subscriber::EnvFilter;

const TTL_SECS: i64 = 30;

fn cache_stage() -> CacheMiddleware {
    match std::env::var("REDIS_HOST") {
        Ok(host) => {
            let port = std::env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_owned());
            let mut config = CacheConfig::new(host, port, TTL_SECS);
            if let Ok(password) = std::env::var("REDIS_PASSWORD") {
                config = config.password(password);
            }
            CacheMiddleware::from_config(&config)
        }
        Err(_) => CacheMiddleware::new(Arc::new(MemoryStore::new()), Ttl::from_secs(TTL_SECS as u64)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let renders = Arc::new(AtomicU64::new(0));
    let server = Server::bind("127.0.0.1:8080").await?;
    tracing::info!(addr = %server.local_addr(), "cached_api ready");

    server
        .serve(vec![
            from_middleware(Arc::new(LoggerMiddleware)),
            from_middleware(Arc::new(cache_stage())),
            handler(move |ctx: Context| {
                let render = renders.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    let body = serde_json::json!({
                        "path": ctx.request().path(),
                        "query": ctx.request().query_string(),
                        "render": render,
                    });
                    Response::new(StatusCode::OK)
                        .header("Content-Type", "application/json")
                        .body(body.to_string())
                }
            }),
        ])
        .await?;

    Ok(())
}
