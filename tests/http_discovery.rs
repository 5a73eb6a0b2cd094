//! Namespace discovery against real HTTP endpoints.

#![cfg(feature = "http")]

mod common;

use common::{Behavior, base_url, start_config_service};
use hotswap_namespaces::discovery::NamespaceDiscovery;
use hotswap_namespaces::prelude::*;
use hotswap_namespaces::sources::{ReqwestFetcher, StaticEndpointSource};
use std::sync::Arc;
use std::time::Duration;

async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    base_url(addr)
}

fn discovery(endpoints: Vec<String>, timeout: Duration) -> NamespaceDiscovery {
    let fetcher = ReqwestFetcher::builder().build().unwrap();
    NamespaceDiscovery::new(
        Arc::new(StaticEndpointSource::new(endpoints)),
        Arc::new(fetcher),
    )
    .with_timeout(timeout)
}

#[tokio::test]
async fn test_discovers_from_first_endpoint() {
    let addr = start_config_service(Behavior::Namespaces(&["application", "redis"])).await;

    let found = discovery(vec![base_url(addr)], Duration::from_secs(2))
        .discover("app1", "default")
        .await
        .unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].app_id, "app1");
    assert_eq!(found[0].cluster_name, "default");
    assert_eq!(found[1].namespace_name, "redis");
}

#[tokio::test]
async fn test_trailing_slash_endpoint() {
    let addr = start_config_service(Behavior::Namespaces(&["application"])).await;

    let found = discovery(vec![format!("{}/", base_url(addr))], Duration::from_secs(2))
        .discover("app1", "default")
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_fails_over_past_refused_and_error_endpoints() {
    let failing = start_config_service(Behavior::Status(503)).await;
    let healthy = start_config_service(Behavior::Namespaces(&["mysql"])).await;

    let found = discovery(
        vec![closed_endpoint().await, base_url(failing), base_url(healthy)],
        Duration::from_secs(2),
    )
    .discover("app1", "default")
    .await
    .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].namespace_name, "mysql");
}

#[tokio::test]
async fn test_malformed_body_counts_as_failure() {
    let garbage = start_config_service(Behavior::Garbage).await;
    let healthy = start_config_service(Behavior::Namespaces(&["application"])).await;

    let found = discovery(
        vec![base_url(garbage), base_url(healthy)],
        Duration::from_secs(2),
    )
    .discover("app1", "default")
    .await
    .unwrap();

    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_all_endpoints_failing_yields_empty_result() {
    let failing = start_config_service(Behavior::Status(500)).await;
    let garbage = start_config_service(Behavior::Garbage).await;

    let found = discovery(
        vec![base_url(failing), base_url(garbage)],
        Duration::from_secs(2),
    )
    .discover("app1", "default")
    .await
    .unwrap();

    assert!(found.is_empty());
}

#[tokio::test]
async fn test_slow_endpoint_times_out_then_next_answers() {
    let slow = start_config_service(Behavior::Slow(
        Duration::from_secs(5),
        &["application", "never-seen"],
    ))
    .await;
    let healthy = start_config_service(Behavior::Namespaces(&["application", "redis"])).await;

    let started = std::time::Instant::now();
    let client = NamespaceClient::builder()
        .with_app_id("app1")
        .with_endpoints([base_url(slow), base_url(healthy)])
        .with_timeout(Duration::from_millis(200))
        .build()
        .unwrap();

    let namespaces = client.refresh_namespaces().await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(
        namespaces.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["application", "redis"]
    );
}

#[tokio::test]
async fn test_unreachable_service_keeps_static_namespaces() {
    let client = NamespaceClient::builder()
        .with_app_id("app1")
        .with_endpoints([closed_endpoint().await])
        .with_static_namespaces(["application", "FX.apollo"])
        .with_timeout(Duration::from_millis(500))
        .build()
        .unwrap();

    let namespaces = client.refresh_namespaces().await;

    assert_eq!(
        namespaces.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["FX.apollo", "application"]
    );
    assert!(client.discovered().is_empty());
}
