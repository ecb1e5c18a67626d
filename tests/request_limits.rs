mod support;

use std::time::Duration;

use respcache::StatusCode;
use respcache::cache::CacheMiddleware;

use support::*;

#[tokio::test]
async fn declared_body_over_limit_is_rejected_before_buffering() {
    let service = CachedService::start(CacheMiddleware::disabled(), StatusCode::OK, "{}").await;

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        service.send_raw(b"POST /upload HTTP/1.1\r\nHost: test\r\nContent-Length: 1000000000\r\n\r\n"),
    )
    .await
    .expect("server answered without waiting for the body");

    assert_eq!(response.status, 413);
    assert_eq!(response.header("Connection"), Some("close"));
    assert_eq!(service.upstream_calls(), 0);
}

#[tokio::test]
async fn content_length_at_usize_max_is_rejected() {
    let service = CachedService::start(CacheMiddleware::disabled(), StatusCode::OK, "{}").await;

    let response = service
        .send_raw(b"POST / HTTP/1.1\r\nHost: test\r\nContent-Length: 18446744073709551615\r\n\r\n")
        .await;

    assert_eq!(response.status, 413);
    assert_eq!(service.upstream_calls(), 0);
}

#[tokio::test]
async fn small_body_is_still_served() {
    let service = CachedService::start(CacheMiddleware::disabled(), StatusCode::OK, "{}").await;

    let response = service
        .send_raw(b"POST / HTTP/1.1\r\nHost: test\r\nConnection: close\r\nContent-Length: 5\r\n\r\nhello")
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(service.upstream_calls(), 1);
}
